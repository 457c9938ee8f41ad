use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::error;

use storefront_core::DomainError;
use storefront_infra::CatalogError;

pub const INTERNAL_ERROR_MESSAGE: &str = "Unexpected internal error occurred";

pub fn catalog_error_to_response(err: CatalogError) -> axum::response::Response {
    match err {
        CatalogError::Domain(err) => domain_error_to_response(err),
        CatalogError::Creation { state, source } => {
            error!(state = %state, error = %source, "product creation failed");
            internal_error()
        }
        CatalogError::Store(source) => {
            error!(error = %source, "catalog store failure");
            internal_error()
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(_) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_id", err.to_string())
        }
        DomainError::AlreadyExists(msg) => json_error(StatusCode::BAD_REQUEST, "already_exists", msg),
        DomainError::NotFound { .. } => {
            json_error(StatusCode::NOT_FOUND, "not_found", err.to_string())
        }
    }
}

fn internal_error() -> axum::response::Response {
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        INTERNAL_ERROR_MESSAGE,
    )
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Serialize `value` with `status`, or map the catalog error.
pub fn respond<T: serde::Serialize>(
    status: StatusCode,
    result: Result<T, CatalogError>,
) -> axum::response::Response {
    match result {
        Ok(value) => (status, axum::Json(value)).into_response(),
        Err(err) => catalog_error_to_response(err),
    }
}
