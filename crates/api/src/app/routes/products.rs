use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Json, Path, Query,
    },
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tracing::error;

use storefront_catalog::{ProductCreationInput, ProductUpdate};

use crate::app::dto::ListParams;
use crate::app::errors;
use crate::app::routes::{common, options};
use crate::app::services::AppServices;

/// Product routes.
///
/// `/product/:id` is keyed by SKU; `/product/:id/options` by product root id.
/// Both share the `:id` segment name because the router requires it.
pub fn router() -> Router {
    Router::new()
        .route("/products", get(list_products))
        .route("/product", post(create_product))
        .route(
            "/product/:id",
            get(get_product)
                .head(product_exists)
                .patch(update_product)
                .delete(archive_product),
        )
        .route(
            "/product/:id/options",
            get(options::list_options_for_root).post(options::create_option),
        )
}

/// Create a product family: root, options, values and every variant.
pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<ProductCreationInput>, JsonRejection>,
) -> axum::response::Response {
    let input = match common::json_body(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(
        StatusCode::CREATED,
        services.catalog.create_product(input).await,
    )
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> axum::response::Response {
    let query = match common::list_query(params) {
        Ok(q) => q,
        Err(resp) => return resp,
    };
    errors::respond(StatusCode::OK, services.catalog.list_products(query).await)
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(sku): Path<String>,
) -> axum::response::Response {
    errors::respond(StatusCode::OK, services.catalog.get_product(&sku).await)
}

/// Existence check; the body is always empty.
pub async fn product_exists(
    Extension(services): Extension<Arc<AppServices>>,
    Path(sku): Path<String>,
) -> StatusCode {
    match services.catalog.product_exists(&sku).await {
        Ok(true) => StatusCode::OK,
        Ok(false) => StatusCode::NOT_FOUND,
        Err(err) => {
            error!(sku = %sku, error = %err, "product existence check failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(sku): Path<String>,
    body: Result<Json<ProductUpdate>, JsonRejection>,
) -> axum::response::Response {
    let update = match common::json_body(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(
        StatusCode::OK,
        services.catalog.update_product(&sku, update).await,
    )
}

pub async fn archive_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(sku): Path<String>,
) -> axum::response::Response {
    errors::respond(StatusCode::OK, services.catalog.archive_product(&sku).await)
}
