use std::str::FromStr;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Query};
use axum::http::StatusCode;

use storefront_core::{DomainError, ListQuery};

use crate::app::dto::ListParams;
use crate::app::errors;

/// Parse a path identifier, answering 400 on malformed input.
pub fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse().map_err(errors::domain_error_to_response)
}

/// Unwrap a JSON body, answering with the usual error shape on rejection.
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, axum::response::Response> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_body",
            rejection.body_text(),
        )),
    }
}

pub fn list_query(
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<ListQuery, axum::response::Response> {
    match params {
        Ok(Query(params)) => Ok(params.into()),
        Err(rejection) => Err(errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_query",
            rejection.body_text(),
        )),
    }
}
