use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::CatalogEventType;

/// One notification as delivered to webhook targets.
///
/// `payload` is the body sent to every target; `delivery_id` and `event_type`
/// travel as headers so receivers can deduplicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    delivery_id: Uuid,
    event_type: CatalogEventType,
    occurred_at: DateTime<Utc>,
    payload: serde_json::Value,
}

impl EventEnvelope {
    pub fn new(
        event_type: CatalogEventType,
        occurred_at: DateTime<Utc>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            delivery_id: Uuid::now_v7(),
            event_type,
            occurred_at,
            payload,
        }
    }

    pub fn delivery_id(&self) -> Uuid {
        self.delivery_id
    }

    pub fn event_type(&self) -> CatalogEventType {
        self.event_type
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }
}
