use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info_span, warn, Instrument};

use storefront_events::{CatalogEventType, EventEnvelope, Webhook, WebhookExecutionLog};

use super::executor::WebhookExecutor;
use crate::catalog_store::CatalogStore;

/// Fans a committed catalog event out to every subscribed webhook.
///
/// Delivery runs on spawned tasks and never reports back to the request that
/// triggered it. Each completed HTTP exchange is recorded as a
/// [`WebhookExecutionLog`]; exchanges with no response are only logged.
#[derive(Clone)]
pub struct WebhookNotifier {
    store: Arc<dyn CatalogStore>,
    executor: Arc<dyn WebhookExecutor>,
}

impl WebhookNotifier {
    pub fn new(store: Arc<dyn CatalogStore>, executor: Arc<dyn WebhookExecutor>) -> Self {
        Self { store, executor }
    }

    /// Start delivering `payload` for `event_type`.
    ///
    /// The handle resolves once every target has been tried; callers normally
    /// drop it.
    pub fn dispatch(&self, event_type: CatalogEventType, payload: serde_json::Value) -> JoinHandle<()> {
        let envelope = EventEnvelope::new(event_type, Utc::now(), payload);
        let span = info_span!(
            "webhook_dispatch",
            event_type = %event_type,
            delivery_id = %envelope.delivery_id()
        );
        let notifier = self.clone();
        tokio::spawn(async move { notifier.deliver_all(envelope).await }.instrument(span))
    }

    async fn deliver_all(&self, envelope: EventEnvelope) {
        let targets = match self.store.list_webhooks_for_event(envelope.event_type()).await {
            Ok(targets) => targets,
            Err(err) => {
                error!(error = %err, "failed to load webhook targets");
                return;
            }
        };
        if targets.is_empty() {
            debug!("no webhook targets subscribed");
            return;
        }

        let envelope = Arc::new(envelope);
        let deliveries: Vec<_> = targets
            .into_iter()
            .map(|webhook| {
                let notifier = self.clone();
                let envelope = Arc::clone(&envelope);
                tokio::spawn(
                    async move { notifier.deliver(&webhook, &envelope).await }.in_current_span(),
                )
            })
            .collect();

        for delivery in deliveries {
            if let Err(err) = delivery.await {
                error!(error = %err, "webhook delivery task failed");
            }
        }
    }

    async fn deliver(&self, webhook: &Webhook, envelope: &EventEnvelope) {
        let status = match self.executor.execute(webhook, envelope).await {
            Ok(status) => status,
            Err(err) => {
                warn!(webhook_id = %webhook.id, url = %webhook.url, error = %err, "webhook delivery failed");
                return;
            }
        };

        let log = WebhookExecutionLog::new(webhook.id, status, Utc::now());
        if log.succeeded {
            debug!(webhook_id = %webhook.id, status, "webhook delivered");
        } else {
            warn!(webhook_id = %webhook.id, url = %webhook.url, status, "webhook target rejected delivery");
        }

        if let Err(err) = self.store.create_webhook_execution_log(&log).await {
            error!(webhook_id = %webhook.id, error = %err, "failed to record webhook execution");
        }
    }
}
