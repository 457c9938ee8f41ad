use serde::{Deserialize, Serialize};

use storefront_core::DomainError;

/// Catalog events webhook targets can subscribe to.
///
/// Events are emitted only after the change they describe has committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogEventType {
    ProductCreated,
    ProductUpdated,
    ProductArchived,
}

impl CatalogEventType {
    pub const ALL: [CatalogEventType; 3] = [
        CatalogEventType::ProductCreated,
        CatalogEventType::ProductUpdated,
        CatalogEventType::ProductArchived,
    ];

    /// Stable event key (e.g. "product_created").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProductCreated => "product_created",
            Self::ProductUpdated => "product_updated",
            Self::ProductArchived => "product_archived",
        }
    }
}

impl core::fmt::Display for CatalogEventType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for CatalogEventType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown event type '{s}'")))
    }
}
