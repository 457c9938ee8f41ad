//! Webhook targets and their delivery log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult, Entity, WebhookId};

use crate::event::CatalogEventType;

pub const JSON_CONTENT_TYPE: &str = "application/json";

fn default_content_type() -> String {
    JSON_CONTENT_TYPE.to_string()
}

/// A registered notification target for one event type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Webhook {
    pub id: WebhookId,
    pub url: String,
    pub event_type: CatalogEventType,
    pub content_type: String,
    pub created_on: DateTime<Utc>,
    pub updated_on: Option<DateTime<Utc>>,
    pub archived_on: Option<DateTime<Utc>>,
}

impl Entity for Webhook {
    type Id = WebhookId;

    fn id(&self) -> WebhookId {
        self.id
    }

    fn is_archived(&self) -> bool {
        self.archived_on.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWebhook {
    pub url: String,
    pub event_type: CatalogEventType,
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

impl NewWebhook {
    pub fn validate(&self) -> DomainResult<()> {
        validate_url(&self.url)?;
        validate_content_type(&self.content_type)
    }

    pub fn into_webhook(self, id: WebhookId, created_on: DateTime<Utc>) -> Webhook {
        Webhook {
            id,
            url: self.url,
            event_type: self.event_type,
            content_type: self.content_type,
            created_on,
            updated_on: None,
            archived_on: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookUpdate {
    pub url: Option<String>,
    pub event_type: Option<CatalogEventType>,
    pub content_type: Option<String>,
}

impl WebhookUpdate {
    pub fn apply_to(&self, webhook: &mut Webhook) -> DomainResult<()> {
        if let Some(url) = &self.url {
            validate_url(url)?;
        }
        if let Some(content_type) = &self.content_type {
            validate_content_type(content_type)?;
        }

        if let Some(url) = &self.url {
            webhook.url = url.clone();
        }
        if let Some(event_type) = self.event_type {
            webhook.event_type = event_type;
        }
        if let Some(content_type) = &self.content_type {
            webhook.content_type = content_type.clone();
        }
        Ok(())
    }
}

/// Outcome of one completed delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookExecutionLog {
    pub webhook_id: WebhookId,
    pub status_code: u16,
    pub succeeded: bool,
    pub executed_on: DateTime<Utc>,
}

impl WebhookExecutionLog {
    /// Any 2xx status counts as success.
    pub fn new(webhook_id: WebhookId, status_code: u16, executed_on: DateTime<Utc>) -> Self {
        Self {
            webhook_id,
            status_code,
            succeeded: (200..300).contains(&status_code),
            executed_on,
        }
    }
}

fn validate_url(url: &str) -> DomainResult<()> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or_else(|| DomainError::validation(format!("webhook url '{url}' must use http or https")))?;
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() || host.chars().any(char::is_whitespace) {
        return Err(DomainError::validation(format!(
            "webhook url '{url}' has no valid host"
        )));
    }
    Ok(())
}

fn validate_content_type(content_type: &str) -> DomainResult<()> {
    if content_type != JSON_CONTENT_TYPE {
        return Err(DomainError::validation(format!(
            "unsupported webhook content type '{content_type}': only {JSON_CONTENT_TYPE} is supported"
        )));
    }
    Ok(())
}
