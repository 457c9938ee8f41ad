use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use storefront_catalog::{
    Discount, NewDiscount, NewProduct, NewProductRoot, Product, ProductOption, ProductOptionValue,
    ProductRoot,
};
use storefront_core::{
    DiscountId, ListQuery, Page, ProductId, ProductOptionId, ProductOptionValueId,
    ProductRootId, WebhookId,
};
use storefront_events::{CatalogEventType, NewWebhook, Webhook, WebhookExecutionLog};

pub type StoreResult<T> = Result<T, StoreError>;

/// Catalog store operation error.
///
/// These are **infrastructure errors**. Lookups that miss and uniqueness
/// backstops are reported here too so callers can turn them into client errors.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The row does not exist or is archived.
    #[error("{entity} with {field} '{value}' not found")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    /// A uniqueness constraint rejected the write.
    #[error("{0}")]
    UniqueViolation(String),

    /// Anything else (connection, serialization, poisoned lock, ...).
    #[error("storage error: {0}")]
    Storage(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, field: &'static str, value: impl ToString) -> Self {
        Self::NotFound {
            entity,
            field,
            value: value.to_string(),
        }
    }
}

/// Catalog persistence boundary.
///
/// ## Reads
///
/// Every read hides archived rows. Family reads (`get_product_root`) attach the
/// root's active options (with values) and active products (with their
/// applicable option values).
///
/// ## Writes
///
/// Single-row writes are issued directly on the store. Multi-row workflows open
/// a [`CatalogTransaction`] with [`CatalogStore::begin`]; nothing written through
/// a transaction is visible to other readers until it commits.
///
/// ## Uniqueness backstops
///
/// Implementations reject (with [`StoreError::UniqueViolation`]) a second active
/// root with the same SKU prefix, a second active product with the same SKU, a
/// duplicate active option name within a root, and a duplicate active value
/// within an option, even when a concurrent request passed the pre-checks.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Open a transaction owned exclusively by the caller.
    async fn begin(&self) -> StoreResult<Box<dyn CatalogTransaction>>;

    // roots

    async fn product_root_with_sku_prefix_exists(&self, sku_prefix: &str) -> StoreResult<bool>;

    async fn product_root_exists(&self, id: ProductRootId) -> StoreResult<bool>;

    async fn get_product_root(&self, id: ProductRootId) -> StoreResult<ProductRoot>;

    async fn list_product_roots(&self, query: ListQuery) -> StoreResult<Page<ProductRoot>>;

    // products

    async fn product_with_sku_exists(&self, sku: &str) -> StoreResult<bool>;

    async fn get_product_by_sku(&self, sku: &str) -> StoreResult<Product>;

    async fn list_products(&self, query: ListQuery) -> StoreResult<Page<Product>>;

    /// Persist every mutable column of `product`; returns the new `updated_on`.
    async fn update_product(&self, product: &Product) -> StoreResult<DateTime<Utc>>;

    // options and values

    async fn get_product_option(&self, id: ProductOptionId) -> StoreResult<ProductOption>;

    async fn list_product_options_for_root(
        &self,
        root_id: ProductRootId,
    ) -> StoreResult<Vec<ProductOption>>;

    async fn product_option_with_name_exists_for_root(
        &self,
        name: &str,
        root_id: ProductRootId,
    ) -> StoreResult<bool>;

    async fn update_product_option(
        &self,
        id: ProductOptionId,
        name: &str,
    ) -> StoreResult<DateTime<Utc>>;

    async fn get_product_option_value(
        &self,
        id: ProductOptionValueId,
    ) -> StoreResult<ProductOptionValue>;

    async fn product_option_value_exists_for_option(
        &self,
        option_id: ProductOptionId,
        value: &str,
    ) -> StoreResult<bool>;

    async fn update_product_option_value(
        &self,
        id: ProductOptionValueId,
        value: &str,
    ) -> StoreResult<DateTime<Utc>>;

    async fn archive_product_option_value(
        &self,
        id: ProductOptionValueId,
    ) -> StoreResult<DateTime<Utc>>;

    // webhooks

    async fn create_webhook(&self, webhook: &NewWebhook) -> StoreResult<Webhook>;

    async fn get_webhook(&self, id: WebhookId) -> StoreResult<Webhook>;

    async fn list_webhooks(&self, query: ListQuery) -> StoreResult<Page<Webhook>>;

    /// Active targets for one event type, oldest first.
    async fn list_webhooks_for_event(
        &self,
        event_type: CatalogEventType,
    ) -> StoreResult<Vec<Webhook>>;

    async fn update_webhook(&self, webhook: &Webhook) -> StoreResult<DateTime<Utc>>;

    async fn archive_webhook(&self, id: WebhookId) -> StoreResult<DateTime<Utc>>;

    async fn create_webhook_execution_log(&self, log: &WebhookExecutionLog) -> StoreResult<()>;

    async fn list_webhook_execution_logs(
        &self,
        webhook_id: WebhookId,
    ) -> StoreResult<Vec<WebhookExecutionLog>>;

    // discounts

    async fn create_discount(&self, discount: &NewDiscount) -> StoreResult<Discount>;

    async fn get_discount(&self, id: DiscountId) -> StoreResult<Discount>;

    async fn list_discounts(&self, query: ListQuery) -> StoreResult<Page<Discount>>;

    async fn update_discount(&self, discount: &Discount) -> StoreResult<DateTime<Utc>>;

    async fn archive_discount(&self, id: DiscountId) -> StoreResult<DateTime<Utc>>;
}

/// Writes that must land together.
///
/// Dropping a transaction without calling [`CatalogTransaction::commit`] discards
/// every write made through it.
#[async_trait]
pub trait CatalogTransaction: Send {
    /// Returns the new root's id and creation time.
    async fn create_product_root(
        &mut self,
        root: &NewProductRoot,
    ) -> StoreResult<(ProductRootId, DateTime<Utc>)>;

    async fn create_product_option(
        &mut self,
        root_id: ProductRootId,
        name: &str,
    ) -> StoreResult<(ProductOptionId, DateTime<Utc>)>;

    async fn create_product_option_value(
        &mut self,
        option_id: ProductOptionId,
        value: &str,
    ) -> StoreResult<(ProductOptionValueId, DateTime<Utc>)>;

    /// Returns the new variant's id, its `available_on` and its creation time.
    async fn create_product(
        &mut self,
        product: &NewProduct,
    ) -> StoreResult<(ProductId, DateTime<Utc>, DateTime<Utc>)>;

    /// Link a variant to every option value that produced it.
    async fn create_multiple_product_variant_bridges_for_product_id(
        &mut self,
        product_id: ProductId,
        option_value_ids: &[ProductOptionValueId],
    ) -> StoreResult<()>;

    async fn archive_product_variant_bridges_for_root(
        &mut self,
        root_id: ProductRootId,
    ) -> StoreResult<()>;

    async fn archive_product_option_values_for_root(
        &mut self,
        root_id: ProductRootId,
    ) -> StoreResult<()>;

    async fn archive_product_options_for_root(&mut self, root_id: ProductRootId)
    -> StoreResult<()>;

    async fn archive_products_for_root(&mut self, root_id: ProductRootId) -> StoreResult<()>;

    async fn archive_product_root(&mut self, root_id: ProductRootId)
    -> StoreResult<DateTime<Utc>>;

    async fn archive_product_option_values_for_option(
        &mut self,
        option_id: ProductOptionId,
    ) -> StoreResult<()>;

    async fn archive_product_option(
        &mut self,
        option_id: ProductOptionId,
    ) -> StoreResult<DateTime<Utc>>;

    async fn delete_product_variant_bridges_for_product(
        &mut self,
        product_id: ProductId,
    ) -> StoreResult<()>;

    async fn archive_product(&mut self, product_id: ProductId) -> StoreResult<DateTime<Utc>>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;

    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}
