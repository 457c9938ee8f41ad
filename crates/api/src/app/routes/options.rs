use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Json, Path},
    http::StatusCode,
    routing::{get, post},
    Router,
};

use storefront_catalog::{OptionInput, OptionUpdate};
use storefront_core::{ProductOptionId, ProductRootId};

use crate::app::dto::OptionValueRequest;
use crate::app::errors;
use crate::app::routes::common;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route(
            "/product_options/:id",
            get(get_option).patch(update_option).delete(archive_option),
        )
        .route("/product_options/:id/value", post(create_option_value))
}

/// `GET /product/:id/options`, mounted by the product router.
pub async fn list_options_for_root(
    Extension(services): Extension<Arc<AppServices>>,
    Path(root_id): Path<String>,
) -> axum::response::Response {
    let root_id: ProductRootId = match common::parse_id(&root_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(
        StatusCode::OK,
        services.catalog.list_options_for_root(root_id).await,
    )
}

/// `POST /product/:id/options`. Existing variants are not regenerated.
pub async fn create_option(
    Extension(services): Extension<Arc<AppServices>>,
    Path(root_id): Path<String>,
    body: Result<Json<OptionInput>, JsonRejection>,
) -> axum::response::Response {
    let root_id: ProductRootId = match common::parse_id(&root_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let input = match common::json_body(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(
        StatusCode::CREATED,
        services.catalog.create_option(root_id, input).await,
    )
}

pub async fn get_option(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductOptionId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(StatusCode::OK, services.catalog.get_product_option(id).await)
}

pub async fn update_option(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<OptionUpdate>, JsonRejection>,
) -> axum::response::Response {
    let id: ProductOptionId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let update = match common::json_body(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(
        StatusCode::OK,
        services.catalog.update_option(id, update).await,
    )
}

pub async fn archive_option(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductOptionId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(StatusCode::OK, services.catalog.archive_option(id).await)
}

pub async fn create_option_value(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<OptionValueRequest>, JsonRejection>,
) -> axum::response::Response {
    let option_id: ProductOptionId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let body = match common::json_body(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(
        StatusCode::CREATED,
        services
            .catalog
            .create_option_value(option_id, &body.value)
            .await,
    )
}
