//! In-memory catalog store (tests/dev).
//!
//! Transactions work on a private copy of the tables taken at `begin` and record
//! every write. `commit` replays the recorded writes onto the current shared
//! tables under the write lock, re-checking every uniqueness rule, and swaps the
//! result in only if all of them apply. A transaction that is dropped or rolled
//! back leaves no trace.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use storefront_catalog::{
    Discount, NewDiscount, NewProduct, NewProductRoot, Product, ProductOption, ProductOptionValue,
    ProductRoot,
};
use storefront_core::{
    DiscountId, Entity, ListQuery, Page, ProductId, ProductOptionId, ProductOptionValueId,
    ProductRootId, WebhookId,
};
use storefront_events::{CatalogEventType, NewWebhook, Webhook, WebhookExecutionLog};

use super::r#trait::{CatalogStore, CatalogTransaction, StoreError, StoreResult};

/// Deliberate failure points, for exercising rollback paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedFailure {
    /// Fail the n-th (1-based) variant insert within a transaction.
    ProductInsert(usize),
    /// Fail the n-th (1-based) bridge insert within a transaction.
    BridgeInsert(usize),
    /// Fail every commit.
    Commit,
}

#[derive(Debug, Clone)]
struct VariantBridge {
    product_id: ProductId,
    option_value_id: ProductOptionValueId,
    archived_on: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    roots: BTreeMap<ProductRootId, ProductRoot>,
    options: BTreeMap<ProductOptionId, ProductOption>,
    values: BTreeMap<ProductOptionValueId, ProductOptionValue>,
    products: BTreeMap<ProductId, Product>,
    bridges: Vec<VariantBridge>,
    webhooks: BTreeMap<WebhookId, Webhook>,
    webhook_logs: Vec<WebhookExecutionLog>,
    discounts: BTreeMap<DiscountId, Discount>,
}

/// A write recorded by a transaction.
#[derive(Debug, Clone)]
enum Write {
    InsertRoot(ProductRoot),
    InsertOption(ProductOption),
    InsertValue(ProductOptionValue),
    InsertProduct(Product),
    InsertBridges(ProductId, Vec<ProductOptionValueId>),
    ArchiveBridgesForRoot(ProductRootId, DateTime<Utc>),
    ArchiveValuesForRoot(ProductRootId, DateTime<Utc>),
    ArchiveOptionsForRoot(ProductRootId, DateTime<Utc>),
    ArchiveProductsForRoot(ProductRootId, DateTime<Utc>),
    ArchiveRoot(ProductRootId, DateTime<Utc>),
    ArchiveValuesForOption(ProductOptionId, DateTime<Utc>),
    ArchiveOption(ProductOptionId, DateTime<Utc>),
    DeleteBridgesForProduct(ProductId),
    ArchiveProduct(ProductId, DateTime<Utc>),
}

fn active<T: Entity>(table: &BTreeMap<T::Id, T>, id: T::Id) -> Option<&T> {
    table.get(&id).filter(|row| !row.is_archived())
}

fn active_mut<T: Entity>(table: &mut BTreeMap<T::Id, T>, id: T::Id) -> Option<&mut T> {
    table.get_mut(&id).filter(|row| !row.is_archived())
}

fn active_rows<T: Entity + Clone>(table: &BTreeMap<T::Id, T>) -> Vec<T> {
    table.values().filter(|row| !row.is_archived()).cloned().collect()
}

impl Tables {
    fn sku_prefix_taken(&self, sku_prefix: &str) -> bool {
        self.roots
            .values()
            .any(|r| !r.is_archived() && r.sku_prefix == sku_prefix)
    }

    fn sku_taken(&self, sku: &str, except: Option<ProductId>) -> bool {
        self.products
            .values()
            .any(|p| !p.is_archived() && p.sku == sku && Some(p.id) != except)
    }

    fn option_name_taken(
        &self,
        root_id: ProductRootId,
        name: &str,
        except: Option<ProductOptionId>,
    ) -> bool {
        self.options.values().any(|o| {
            !o.is_archived() && o.product_root_id == root_id && o.name == name && Some(o.id) != except
        })
    }

    fn value_taken(
        &self,
        option_id: ProductOptionId,
        value: &str,
        except: Option<ProductOptionValueId>,
    ) -> bool {
        self.values.values().any(|v| {
            !v.is_archived()
                && v.product_option_id == option_id
                && v.value == value
                && Some(v.id) != except
        })
    }

    fn option_ids_for_root(&self, root_id: ProductRootId) -> Vec<ProductOptionId> {
        self.options
            .values()
            .filter(|o| o.product_root_id == root_id)
            .map(|o| o.id)
            .collect()
    }

    fn product_ids_for_root(&self, root_id: ProductRootId) -> Vec<ProductId> {
        self.products
            .values()
            .filter(|p| p.product_root_id == root_id)
            .map(|p| p.id)
            .collect()
    }

    fn archive_values_where(
        &mut self,
        at: DateTime<Utc>,
        pred: impl Fn(&ProductOptionValue) -> bool,
    ) {
        for value in self.values.values_mut() {
            if value.archived_on.is_none() && pred(value) {
                value.archived_on = Some(at);
            }
        }
    }

    fn apply(&mut self, write: &Write) -> StoreResult<()> {
        match write {
            Write::InsertRoot(root) => {
                if self.sku_prefix_taken(&root.sku_prefix) {
                    return Err(StoreError::UniqueViolation(format!(
                        "product with sku '{}' already exists",
                        root.sku_prefix
                    )));
                }
                self.roots.insert(root.id, root.clone());
            }
            Write::InsertOption(option) => {
                if active(&self.roots, option.product_root_id).is_none() {
                    return Err(StoreError::Storage(format!(
                        "option references missing product root {}",
                        option.product_root_id
                    )));
                }
                if self.option_name_taken(option.product_root_id, &option.name, None) {
                    return Err(StoreError::UniqueViolation(format!(
                        "product option with the name '{}' already exists",
                        option.name
                    )));
                }
                self.options.insert(option.id, option.clone());
            }
            Write::InsertValue(value) => {
                if active(&self.options, value.product_option_id).is_none() {
                    return Err(StoreError::Storage(format!(
                        "option value references missing option {}",
                        value.product_option_id
                    )));
                }
                if self.value_taken(value.product_option_id, &value.value, None) {
                    return Err(StoreError::UniqueViolation(format!(
                        "product option value '{}' already exists for option ID {}",
                        value.value, value.product_option_id
                    )));
                }
                self.values.insert(value.id, value.clone());
            }
            Write::InsertProduct(product) => {
                if active(&self.roots, product.product_root_id).is_none() {
                    return Err(StoreError::Storage(format!(
                        "product references missing product root {}",
                        product.product_root_id
                    )));
                }
                if self.sku_taken(&product.sku, None) {
                    return Err(StoreError::UniqueViolation(format!(
                        "product with sku '{}' already exists",
                        product.sku
                    )));
                }
                self.products.insert(product.id, product.clone());
            }
            Write::InsertBridges(product_id, value_ids) => {
                if !self.products.contains_key(product_id) {
                    return Err(StoreError::Storage(format!(
                        "bridge references missing product {product_id}"
                    )));
                }
                if let Some(missing) = value_ids.iter().find(|id| !self.values.contains_key(*id)) {
                    return Err(StoreError::Storage(format!(
                        "bridge references missing option value {missing}"
                    )));
                }
                self.bridges.extend(value_ids.iter().map(|&option_value_id| VariantBridge {
                    product_id: *product_id,
                    option_value_id,
                    archived_on: None,
                }));
            }
            Write::ArchiveBridgesForRoot(root_id, at) => {
                let product_ids = self.product_ids_for_root(*root_id);
                for bridge in &mut self.bridges {
                    if bridge.archived_on.is_none() && product_ids.contains(&bridge.product_id) {
                        bridge.archived_on = Some(*at);
                    }
                }
            }
            Write::ArchiveValuesForRoot(root_id, at) => {
                let option_ids = self.option_ids_for_root(*root_id);
                self.archive_values_where(*at, |v| option_ids.contains(&v.product_option_id));
            }
            Write::ArchiveOptionsForRoot(root_id, at) => {
                for option in self.options.values_mut() {
                    if option.archived_on.is_none() && option.product_root_id == *root_id {
                        option.archived_on = Some(*at);
                    }
                }
            }
            Write::ArchiveProductsForRoot(root_id, at) => {
                for product in self.products.values_mut() {
                    if product.archived_on.is_none() && product.product_root_id == *root_id {
                        product.archived_on = Some(*at);
                    }
                }
            }
            Write::ArchiveRoot(root_id, at) => {
                let root = active_mut(&mut self.roots, *root_id)
                    .ok_or_else(|| StoreError::not_found("product root", "id", root_id))?;
                root.archived_on = Some(*at);
            }
            Write::ArchiveValuesForOption(option_id, at) => {
                self.archive_values_where(*at, |v| v.product_option_id == *option_id);
            }
            Write::ArchiveOption(option_id, at) => {
                let option = active_mut(&mut self.options, *option_id)
                    .ok_or_else(|| StoreError::not_found("product option", "id", option_id))?;
                option.archived_on = Some(*at);
            }
            Write::DeleteBridgesForProduct(product_id) => {
                self.bridges.retain(|b| b.product_id != *product_id);
            }
            Write::ArchiveProduct(product_id, at) => {
                let product = active_mut(&mut self.products, *product_id)
                    .ok_or_else(|| StoreError::not_found("product", "id", product_id))?;
                product.archived_on = Some(*at);
            }
        }
        Ok(())
    }

    fn options_for_root(&self, root_id: ProductRootId) -> Vec<ProductOption> {
        self.options
            .values()
            .filter(|o| !o.is_archived() && o.product_root_id == root_id)
            .map(|o| self.option_with_values(o))
            .collect()
    }

    fn option_with_values(&self, option: &ProductOption) -> ProductOption {
        let mut option = option.clone();
        option.values = self
            .values
            .values()
            .filter(|v| !v.is_archived() && v.product_option_id == option.id)
            .cloned()
            .collect();
        option
    }

    fn product_with_options(&self, product: &Product) -> Product {
        let mut product = product.clone();
        product.applicable_options = self
            .bridges
            .iter()
            .filter(|b| b.archived_on.is_none() && b.product_id == product.id)
            .filter_map(|b| active(&self.values, b.option_value_id).cloned())
            .collect();
        product
    }

    fn root_family(&self, id: ProductRootId) -> StoreResult<ProductRoot> {
        let mut root = active(&self.roots, id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("product root", "id", id))?;
        root.options = self.options_for_root(id);
        root.products = self
            .products
            .values()
            .filter(|p| !p.is_archived() && p.product_root_id == id)
            .map(|p| self.product_with_options(p))
            .collect();
        Ok(root)
    }
}

fn poisoned() -> StoreError {
    StoreError::Storage("in-memory catalog lock poisoned".to_string())
}

/// In-memory catalog store.
///
/// Cloning is cheap and clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalogStore {
    tables: Arc<RwLock<Tables>>,
    ids: Arc<AtomicI64>,
    failure: Arc<Mutex<Option<InjectedFailure>>>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make transactions opened from now on fail at `failure` (or stop failing).
    pub fn set_injected_failure(&self, failure: Option<InjectedFailure>) {
        if let Ok(mut slot) = self.failure.lock() {
            *slot = failure;
        }
    }

    fn next_id(&self) -> i64 {
        self.ids.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|_| poisoned())
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|_| poisoned())
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn begin(&self) -> StoreResult<Box<dyn CatalogTransaction>> {
        let working = self.read()?.clone();
        let failure = *self.failure.lock().map_err(|_| poisoned())?;
        Ok(Box::new(InMemoryTransaction {
            shared: self.tables.clone(),
            ids: self.ids.clone(),
            working,
            writes: Vec::new(),
            failure,
            product_inserts: 0,
            bridge_inserts: 0,
        }))
    }

    async fn product_root_with_sku_prefix_exists(&self, sku_prefix: &str) -> StoreResult<bool> {
        Ok(self.read()?.sku_prefix_taken(sku_prefix))
    }

    async fn product_root_exists(&self, id: ProductRootId) -> StoreResult<bool> {
        Ok(active(&self.read()?.roots, id).is_some())
    }

    async fn get_product_root(&self, id: ProductRootId) -> StoreResult<ProductRoot> {
        self.read()?.root_family(id)
    }

    async fn list_product_roots(&self, query: ListQuery) -> StoreResult<Page<ProductRoot>> {
        Ok(query.slice(active_rows(&self.read()?.roots)))
    }

    async fn product_with_sku_exists(&self, sku: &str) -> StoreResult<bool> {
        Ok(self.read()?.sku_taken(sku, None))
    }

    async fn get_product_by_sku(&self, sku: &str) -> StoreResult<Product> {
        let tables = self.read()?;
        tables
            .products
            .values()
            .find(|p| !p.is_archived() && p.sku == sku)
            .map(|p| tables.product_with_options(p))
            .ok_or_else(|| StoreError::not_found("product", "sku", sku))
    }

    async fn list_products(&self, query: ListQuery) -> StoreResult<Page<Product>> {
        let tables = self.read()?;
        let products = active_rows(&tables.products);
        Ok(query
            .slice(products)
            .map(|p| tables.product_with_options(&p)))
    }

    async fn update_product(&self, product: &Product) -> StoreResult<DateTime<Utc>> {
        let mut tables = self.write()?;
        if tables.sku_taken(&product.sku, Some(product.id)) {
            return Err(StoreError::UniqueViolation(format!(
                "product with sku '{}' already exists",
                product.sku
            )));
        }
        let row = active_mut(&mut tables.products, product.id)
            .ok_or_else(|| StoreError::not_found("product", "id", product.id))?;
        let now = Utc::now();
        row.sku = product.sku.clone();
        row.details = product.details.clone();
        row.updated_on = Some(now);
        Ok(now)
    }

    async fn get_product_option(&self, id: ProductOptionId) -> StoreResult<ProductOption> {
        let tables = self.read()?;
        active(&tables.options, id)
            .map(|o| tables.option_with_values(o))
            .ok_or_else(|| StoreError::not_found("product option", "id", id))
    }

    async fn list_product_options_for_root(
        &self,
        root_id: ProductRootId,
    ) -> StoreResult<Vec<ProductOption>> {
        Ok(self.read()?.options_for_root(root_id))
    }

    async fn product_option_with_name_exists_for_root(
        &self,
        name: &str,
        root_id: ProductRootId,
    ) -> StoreResult<bool> {
        Ok(self.read()?.option_name_taken(root_id, name, None))
    }

    async fn update_product_option(
        &self,
        id: ProductOptionId,
        name: &str,
    ) -> StoreResult<DateTime<Utc>> {
        let mut tables = self.write()?;
        let root_id = active(&tables.options, id)
            .map(|o| o.product_root_id)
            .ok_or_else(|| StoreError::not_found("product option", "id", id))?;
        if tables.option_name_taken(root_id, name, Some(id)) {
            return Err(StoreError::UniqueViolation(format!(
                "product option with the name '{name}' already exists"
            )));
        }
        let now = Utc::now();
        if let Some(option) = active_mut(&mut tables.options, id) {
            option.name = name.to_string();
            option.updated_on = Some(now);
        }
        Ok(now)
    }

    async fn get_product_option_value(
        &self,
        id: ProductOptionValueId,
    ) -> StoreResult<ProductOptionValue> {
        active(&self.read()?.values, id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("product option value", "id", id))
    }

    async fn product_option_value_exists_for_option(
        &self,
        option_id: ProductOptionId,
        value: &str,
    ) -> StoreResult<bool> {
        Ok(self.read()?.value_taken(option_id, value, None))
    }

    async fn update_product_option_value(
        &self,
        id: ProductOptionValueId,
        value: &str,
    ) -> StoreResult<DateTime<Utc>> {
        let mut tables = self.write()?;
        let option_id = active(&tables.values, id)
            .map(|v| v.product_option_id)
            .ok_or_else(|| StoreError::not_found("product option value", "id", id))?;
        if tables.value_taken(option_id, value, Some(id)) {
            return Err(StoreError::UniqueViolation(format!(
                "product option value '{value}' already exists for option ID {option_id}"
            )));
        }
        let now = Utc::now();
        if let Some(row) = active_mut(&mut tables.values, id) {
            row.value = value.to_string();
            row.updated_on = Some(now);
        }
        Ok(now)
    }

    async fn archive_product_option_value(
        &self,
        id: ProductOptionValueId,
    ) -> StoreResult<DateTime<Utc>> {
        let mut tables = self.write()?;
        let row = active_mut(&mut tables.values, id)
            .ok_or_else(|| StoreError::not_found("product option value", "id", id))?;
        let now = Utc::now();
        row.archived_on = Some(now);
        Ok(now)
    }

    async fn create_webhook(&self, webhook: &NewWebhook) -> StoreResult<Webhook> {
        let created = webhook
            .clone()
            .into_webhook(WebhookId::new(self.next_id()), Utc::now());
        self.write()?.webhooks.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_webhook(&self, id: WebhookId) -> StoreResult<Webhook> {
        active(&self.read()?.webhooks, id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("webhook", "id", id))
    }

    async fn list_webhooks(&self, query: ListQuery) -> StoreResult<Page<Webhook>> {
        Ok(query.slice(active_rows(&self.read()?.webhooks)))
    }

    async fn list_webhooks_for_event(
        &self,
        event_type: CatalogEventType,
    ) -> StoreResult<Vec<Webhook>> {
        Ok(active_rows(&self.read()?.webhooks)
            .into_iter()
            .filter(|w| w.event_type == event_type)
            .collect())
    }

    async fn update_webhook(&self, webhook: &Webhook) -> StoreResult<DateTime<Utc>> {
        let mut tables = self.write()?;
        let row = active_mut(&mut tables.webhooks, webhook.id)
            .ok_or_else(|| StoreError::not_found("webhook", "id", webhook.id))?;
        let now = Utc::now();
        row.url = webhook.url.clone();
        row.event_type = webhook.event_type;
        row.content_type = webhook.content_type.clone();
        row.updated_on = Some(now);
        Ok(now)
    }

    async fn archive_webhook(&self, id: WebhookId) -> StoreResult<DateTime<Utc>> {
        let mut tables = self.write()?;
        let row = active_mut(&mut tables.webhooks, id)
            .ok_or_else(|| StoreError::not_found("webhook", "id", id))?;
        let now = Utc::now();
        row.archived_on = Some(now);
        Ok(now)
    }

    async fn create_webhook_execution_log(&self, log: &WebhookExecutionLog) -> StoreResult<()> {
        self.write()?.webhook_logs.push(log.clone());
        Ok(())
    }

    async fn list_webhook_execution_logs(
        &self,
        webhook_id: WebhookId,
    ) -> StoreResult<Vec<WebhookExecutionLog>> {
        Ok(self
            .read()?
            .webhook_logs
            .iter()
            .filter(|l| l.webhook_id == webhook_id)
            .cloned()
            .collect())
    }

    async fn create_discount(&self, discount: &NewDiscount) -> StoreResult<Discount> {
        let created = discount
            .clone()
            .into_discount(DiscountId::new(self.next_id()), Utc::now());
        self.write()?.discounts.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_discount(&self, id: DiscountId) -> StoreResult<Discount> {
        active(&self.read()?.discounts, id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("discount", "id", id))
    }

    async fn list_discounts(&self, query: ListQuery) -> StoreResult<Page<Discount>> {
        Ok(query.slice(active_rows(&self.read()?.discounts)))
    }

    async fn update_discount(&self, discount: &Discount) -> StoreResult<DateTime<Utc>> {
        let mut tables = self.write()?;
        let row = active_mut(&mut tables.discounts, discount.id)
            .ok_or_else(|| StoreError::not_found("discount", "id", discount.id))?;
        let now = Utc::now();
        *row = Discount {
            created_on: row.created_on,
            updated_on: Some(now),
            archived_on: None,
            ..discount.clone()
        };
        Ok(now)
    }

    async fn archive_discount(&self, id: DiscountId) -> StoreResult<DateTime<Utc>> {
        let mut tables = self.write()?;
        let row = active_mut(&mut tables.discounts, id)
            .ok_or_else(|| StoreError::not_found("discount", "id", id))?;
        let now = Utc::now();
        row.archived_on = Some(now);
        Ok(now)
    }
}

/// Transaction over [`InMemoryCatalogStore`].
pub struct InMemoryTransaction {
    shared: Arc<RwLock<Tables>>,
    ids: Arc<AtomicI64>,
    working: Tables,
    writes: Vec<Write>,
    failure: Option<InjectedFailure>,
    product_inserts: usize,
    bridge_inserts: usize,
}

impl InMemoryTransaction {
    fn next_id(&self) -> i64 {
        self.ids.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Apply to the private copy first so the caller sees constraint failures at once.
    fn stage(&mut self, write: Write) -> StoreResult<()> {
        self.working.apply(&write)?;
        self.writes.push(write);
        Ok(())
    }
}

#[async_trait]
impl CatalogTransaction for InMemoryTransaction {
    async fn create_product_root(
        &mut self,
        root: &NewProductRoot,
    ) -> StoreResult<(ProductRootId, DateTime<Utc>)> {
        let id = ProductRootId::new(self.next_id());
        let created_on = Utc::now();
        self.stage(Write::InsertRoot(root.clone().into_root(id, created_on)))?;
        Ok((id, created_on))
    }

    async fn create_product_option(
        &mut self,
        root_id: ProductRootId,
        name: &str,
    ) -> StoreResult<(ProductOptionId, DateTime<Utc>)> {
        let id = ProductOptionId::new(self.next_id());
        let created_on = Utc::now();
        self.stage(Write::InsertOption(ProductOption {
            id,
            name: name.to_string(),
            product_root_id: root_id,
            values: Vec::new(),
            created_on,
            updated_on: None,
            archived_on: None,
        }))?;
        Ok((id, created_on))
    }

    async fn create_product_option_value(
        &mut self,
        option_id: ProductOptionId,
        value: &str,
    ) -> StoreResult<(ProductOptionValueId, DateTime<Utc>)> {
        let id = ProductOptionValueId::new(self.next_id());
        let created_on = Utc::now();
        self.stage(Write::InsertValue(ProductOptionValue {
            id,
            product_option_id: option_id,
            value: value.to_string(),
            created_on,
            updated_on: None,
            archived_on: None,
        }))?;
        Ok((id, created_on))
    }

    async fn create_product(
        &mut self,
        product: &NewProduct,
    ) -> StoreResult<(ProductId, DateTime<Utc>, DateTime<Utc>)> {
        self.product_inserts += 1;
        if self.failure == Some(InjectedFailure::ProductInsert(self.product_inserts)) {
            return Err(StoreError::Storage(format!(
                "injected failure on product insert #{}",
                self.product_inserts
            )));
        }

        let id = ProductId::new(self.next_id());
        let created_on = Utc::now();
        let available_on = product.details.available_on;
        let mut row = product.clone().into_product(id, available_on, created_on);
        // bridges are the source of truth for applicable options
        row.applicable_options.clear();
        self.stage(Write::InsertProduct(row))?;
        Ok((id, available_on, created_on))
    }

    async fn create_multiple_product_variant_bridges_for_product_id(
        &mut self,
        product_id: ProductId,
        option_value_ids: &[ProductOptionValueId],
    ) -> StoreResult<()> {
        self.bridge_inserts += 1;
        if self.failure == Some(InjectedFailure::BridgeInsert(self.bridge_inserts)) {
            return Err(StoreError::Storage(format!(
                "injected failure on bridge insert #{}",
                self.bridge_inserts
            )));
        }
        self.stage(Write::InsertBridges(product_id, option_value_ids.to_vec()))
    }

    async fn archive_product_variant_bridges_for_root(
        &mut self,
        root_id: ProductRootId,
    ) -> StoreResult<()> {
        self.stage(Write::ArchiveBridgesForRoot(root_id, Utc::now()))
    }

    async fn archive_product_option_values_for_root(
        &mut self,
        root_id: ProductRootId,
    ) -> StoreResult<()> {
        self.stage(Write::ArchiveValuesForRoot(root_id, Utc::now()))
    }

    async fn archive_product_options_for_root(
        &mut self,
        root_id: ProductRootId,
    ) -> StoreResult<()> {
        self.stage(Write::ArchiveOptionsForRoot(root_id, Utc::now()))
    }

    async fn archive_products_for_root(&mut self, root_id: ProductRootId) -> StoreResult<()> {
        self.stage(Write::ArchiveProductsForRoot(root_id, Utc::now()))
    }

    async fn archive_product_root(
        &mut self,
        root_id: ProductRootId,
    ) -> StoreResult<DateTime<Utc>> {
        let at = Utc::now();
        self.stage(Write::ArchiveRoot(root_id, at))?;
        Ok(at)
    }

    async fn archive_product_option_values_for_option(
        &mut self,
        option_id: ProductOptionId,
    ) -> StoreResult<()> {
        self.stage(Write::ArchiveValuesForOption(option_id, Utc::now()))
    }

    async fn archive_product_option(
        &mut self,
        option_id: ProductOptionId,
    ) -> StoreResult<DateTime<Utc>> {
        let at = Utc::now();
        self.stage(Write::ArchiveOption(option_id, at))?;
        Ok(at)
    }

    async fn delete_product_variant_bridges_for_product(
        &mut self,
        product_id: ProductId,
    ) -> StoreResult<()> {
        self.stage(Write::DeleteBridgesForProduct(product_id))
    }

    async fn archive_product(&mut self, product_id: ProductId) -> StoreResult<DateTime<Utc>> {
        let at = Utc::now();
        self.stage(Write::ArchiveProduct(product_id, at))?;
        Ok(at)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        if self.failure == Some(InjectedFailure::Commit) {
            return Err(StoreError::Storage("injected failure on commit".to_string()));
        }

        let mut shared = self.shared.write().map_err(|_| poisoned())?;
        let mut next = shared.clone();
        for write in &self.writes {
            next.apply(write)?;
        }
        *shared = next;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}
