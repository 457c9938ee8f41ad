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

use storefront_core::WebhookId;
use storefront_events::{CatalogEventType, NewWebhook, WebhookUpdate};

use crate::app::dto::ListParams;
use crate::app::errors;
use crate::app::routes::common;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/webhooks", get(list_webhooks))
        .route("/webhooks/:event_type", get(list_webhooks_for_event))
        .route("/webhook", post(create_webhook))
        .route(
            "/webhook/:id",
            get(get_webhook).patch(update_webhook).delete(archive_webhook),
        )
        .route("/webhook/:id/executions", get(list_webhook_executions))
}

pub async fn list_webhooks(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> axum::response::Response {
    let query = match common::list_query(params) {
        Ok(q) => q,
        Err(resp) => return resp,
    };
    errors::respond(StatusCode::OK, services.catalog.list_webhooks(query).await)
}

pub async fn list_webhooks_for_event(
    Extension(services): Extension<Arc<AppServices>>,
    Path(event_type): Path<String>,
) -> axum::response::Response {
    let event_type: CatalogEventType = match event_type.parse() {
        Ok(v) => v,
        Err(err) => return errors::domain_error_to_response(err),
    };
    errors::respond(
        StatusCode::OK,
        services.catalog.list_webhooks_for_event(event_type).await,
    )
}

pub async fn create_webhook(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<NewWebhook>, JsonRejection>,
) -> axum::response::Response {
    let input = match common::json_body(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(
        StatusCode::CREATED,
        services.catalog.create_webhook(input).await,
    )
}

pub async fn get_webhook(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: WebhookId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(StatusCode::OK, services.catalog.get_webhook(id).await)
}

pub async fn update_webhook(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<WebhookUpdate>, JsonRejection>,
) -> axum::response::Response {
    let id: WebhookId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let update = match common::json_body(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(
        StatusCode::OK,
        services.catalog.update_webhook(id, update).await,
    )
}

pub async fn archive_webhook(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: WebhookId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(StatusCode::OK, services.catalog.archive_webhook(id).await)
}

/// Delivery history of one webhook, oldest first.
pub async fn list_webhook_executions(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: WebhookId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::respond(
        StatusCode::OK,
        services.catalog.list_webhook_executions(id).await,
    )
}
