//! Catalog events and the webhook targets that receive them.

pub mod envelope;
pub mod event;
pub mod webhook;

pub use envelope::EventEnvelope;
pub use event::CatalogEventType;
pub use webhook::{NewWebhook, Webhook, WebhookExecutionLog, WebhookUpdate, JSON_CONTENT_TYPE};
