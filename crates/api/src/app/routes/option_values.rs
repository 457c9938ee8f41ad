use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Json, Path},
    http::StatusCode,
    routing::get,
    Router,
};

use storefront_core::ProductOptionValueId;

use crate::app::dto::OptionValueRequest;
use crate::app::errors;
use crate::app::routes::common;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route(
        "/product_option_values/:id",
        get(get_option_value)
            .patch(update_option_value)
            .delete(archive_option_value),
    )
}

pub async fn get_option_value(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductOptionValueId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(
        StatusCode::OK,
        services.catalog.get_product_option_value(id).await,
    )
}

pub async fn update_option_value(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<OptionValueRequest>, JsonRejection>,
) -> axum::response::Response {
    let id: ProductOptionValueId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let body = match common::json_body(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(
        StatusCode::OK,
        services.catalog.update_option_value(id, &body.value).await,
    )
}

pub async fn archive_option_value(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductOptionValueId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(
        StatusCode::OK,
        services.catalog.archive_option_value(id).await,
    )
}
