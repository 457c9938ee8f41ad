//! Catalog persistence boundary.
//!
//! Two implementations share the [`CatalogStore`] / [`CatalogTransaction`] traits:
//! - [`PostgresCatalogStore`]: production storage (see `migrations/`)
//! - [`InMemoryCatalogStore`]: tests and local runs without `DATABASE_URL`

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::{InMemoryCatalogStore, InjectedFailure};
pub use postgres::PostgresCatalogStore;
pub use r#trait::{CatalogStore, CatalogTransaction, StoreError, StoreResult};
