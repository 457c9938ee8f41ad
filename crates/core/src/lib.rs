//! `storefront-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod pagination;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{
    DiscountId, ProductId, ProductOptionId, ProductOptionValueId, ProductRootId, WebhookId,
};
pub use pagination::{ListQuery, Page};
