use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Extension, Path, Query},
    http::StatusCode,
    routing::get,
    Router,
};

use storefront_core::ProductRootId;

use crate::app::dto::ListParams;
use crate::app::errors;
use crate::app::routes::common;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/product_roots", get(list_product_roots))
        .route(
            "/product_root/:id",
            get(get_product_root).delete(archive_product_root),
        )
}

pub async fn list_product_roots(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> axum::response::Response {
    let query = match common::list_query(params) {
        Ok(q) => q,
        Err(resp) => return resp,
    };
    errors::respond(
        StatusCode::OK,
        services.catalog.list_product_roots(query).await,
    )
}

pub async fn get_product_root(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductRootId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(StatusCode::OK, services.catalog.get_product_root(id).await)
}

/// Archives the root together with its options, values and variants.
pub async fn archive_product_root(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductRootId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(
        StatusCode::OK,
        services.catalog.archive_product_root(id).await,
    )
}
