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

use storefront_catalog::{DiscountUpdate, NewDiscount};
use storefront_core::DiscountId;

use crate::app::dto::ListParams;
use crate::app::errors;
use crate::app::routes::common;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/discounts", get(list_discounts))
        .route("/discount", post(create_discount))
        .route(
            "/discount/:id",
            get(get_discount)
                .patch(update_discount)
                .delete(archive_discount),
        )
}

pub async fn list_discounts(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> axum::response::Response {
    let query = match common::list_query(params) {
        Ok(q) => q,
        Err(resp) => return resp,
    };
    errors::respond(StatusCode::OK, services.catalog.list_discounts(query).await)
}

pub async fn create_discount(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<NewDiscount>, JsonRejection>,
) -> axum::response::Response {
    let input = match common::json_body(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(
        StatusCode::CREATED,
        services.catalog.create_discount(input).await,
    )
}

pub async fn get_discount(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: DiscountId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(StatusCode::OK, services.catalog.get_discount(id).await)
}

pub async fn update_discount(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<DiscountUpdate>, JsonRejection>,
) -> axum::response::Response {
    let id: DiscountId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let update = match common::json_body(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(
        StatusCode::OK,
        services.catalog.update_discount(id, update).await,
    )
}

pub async fn archive_discount(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: DiscountId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(StatusCode::OK, services.catalog.archive_discount(id).await)
}
