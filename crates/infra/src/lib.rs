//! Infrastructure layer: catalog storage, the product creation workflow,
//! webhook delivery, and process configuration.

pub mod catalog_service;
pub mod catalog_store;
pub mod config;
pub mod db;
pub mod error;
pub mod product_creation;
pub mod webhooks;

mod integration_tests;

pub use catalog_service::CatalogService;
pub use config::{AppConfig, ConfigError};
pub use error::{CatalogError, CatalogResult};
pub use product_creation::{CreationState, ProductCreationWorkflow};
