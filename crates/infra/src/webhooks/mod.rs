//! Post-commit webhook notification.
//!
//! [`WebhookNotifier`] looks up the targets for an event and hands each one to a
//! [`WebhookExecutor`]; [`HttpWebhookExecutor`] is the production executor.

pub mod executor;
pub mod notifier;

pub use executor::{HttpWebhookExecutor, WebhookError, WebhookExecutor, DELIVERY_HEADER, EVENT_HEADER};
pub use notifier::WebhookNotifier;
