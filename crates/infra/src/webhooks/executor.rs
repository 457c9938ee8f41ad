//! Delivery of one event to one webhook target.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use storefront_events::{EventEnvelope, Webhook};

pub const EVENT_HEADER: &str = "X-Storefront-Event";
pub const DELIVERY_HEADER: &str = "X-Storefront-Delivery";

#[derive(Debug, Error)]
pub enum WebhookError {
    /// No response was received (connect failure, timeout, ...).
    #[error("webhook transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to encode webhook payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Performs one HTTP exchange and reports the response status.
///
/// A non-2xx status is still `Ok`: the exchange completed and gets logged.
#[async_trait]
pub trait WebhookExecutor: Send + Sync {
    async fn execute(&self, webhook: &Webhook, envelope: &EventEnvelope)
    -> Result<u16, WebhookError>;
}

/// `reqwest`-backed executor: POSTs the payload as JSON.
#[derive(Debug, Clone)]
pub struct HttpWebhookExecutor {
    client: reqwest::Client,
}

impl HttpWebhookExecutor {
    pub fn new(timeout: Duration) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WebhookExecutor for HttpWebhookExecutor {
    async fn execute(
        &self,
        webhook: &Webhook,
        envelope: &EventEnvelope,
    ) -> Result<u16, WebhookError> {
        let body = serde_json::to_vec(envelope.payload())?;
        let response = self
            .client
            .post(&webhook.url)
            .header(reqwest::header::CONTENT_TYPE, &webhook.content_type)
            .header(EVENT_HEADER, envelope.event_type().as_str())
            .header(DELIVERY_HEADER, envelope.delivery_id().to_string())
            .body(body)
            .send()
            .await?;
        Ok(response.status().as_u16())
    }
}
