use thiserror::Error;

use storefront_core::DomainError;

use crate::catalog_store::StoreError;
use crate::product_creation::CreationState;

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Error surfaced by catalog services to the HTTP layer.
///
/// `Domain` errors are the caller's fault; `Creation` and `Store` are not and
/// their details stay in the logs.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Product creation failed after reaching `state`; nothing was persisted.
    #[error("product creation failed after {state}: {source}")]
    Creation {
        state: CreationState,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Store(StoreError),
}

impl CatalogError {
    /// The domain error, if this is the caller's fault.
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            Self::Domain(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound {
                entity,
                field,
                value,
            } => Self::Domain(DomainError::NotFound {
                entity,
                field,
                value,
            }),
            StoreError::UniqueViolation(msg) => Self::Domain(DomainError::already_exists(msg)),
            other => Self::Store(other),
        }
    }
}
