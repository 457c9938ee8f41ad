//! Postgres-backed catalog store.
//!
//! Rows are never physically removed (apart from variant bridges when a single
//! product is archived); archival stamps `archived_on` and every read filters on
//! `archived_on IS NULL`.
//!
//! ## Error Mapping
//!
//! SQLx errors are mapped to `StoreError` as follows:
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (unique violation) | `23505` | `UniqueViolation` | Concurrent create slipped past a pre-check (partial unique indexes on active rows) |
//! | Database (foreign key violation) | `23503` | `Storage` | Child row references a missing parent (should not occur) |
//! | Database (check constraint violation) | `23514` | `Storage` | Invalid data |
//! | Database (other) | Any other | `Storage` | Other database errors |
//! | RowNotFound | N/A | `Storage` | Unexpected empty result for `fetch_one` |
//! | PoolClosed / Other | N/A | `Storage` | Network errors, connection failures, etc. |
//!
//! Lookups that find nothing are reported as `StoreError::NotFound` by the
//! caller of `fetch_optional`, never through this table.
//!
//! ## Thread Safety
//!
//! `PostgresCatalogStore` is `Send + Sync` and cheap to clone. A
//! `PgCatalogTransaction` owns one pooled connection until it commits, rolls
//! back, or is dropped (which rolls back).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{instrument, Span};

use storefront_catalog::{
    Discount, DiscountType, NewDiscount, NewProduct, NewProductRoot, PhysicalAttributes, Product,
    ProductDetails, ProductOption, ProductOptionValue, ProductRoot,
};
use storefront_core::{
    DiscountId, ListQuery, Page, ProductId, ProductOptionId, ProductOptionValueId,
    ProductRootId, WebhookId,
};
use storefront_events::{CatalogEventType, NewWebhook, Webhook, WebhookExecutionLog};

use super::r#trait::{CatalogStore, CatalogTransaction, StoreError, StoreResult};

const PHYSICAL_COLUMNS: &str = "product_weight, product_height, product_width, product_length, \
     package_weight, package_height, package_width, package_length";

const ROOT_COLUMNS: &str = "id, sku_prefix, name, subtitle, description, manufacturer, brand, \
     taxable, cost, product_weight, product_height, product_width, product_length, \
     package_weight, package_height, package_width, package_length, quantity_per_package, \
     available_on, created_on, updated_on, archived_on";

const PRODUCT_COLUMNS: &str = "id, product_root_id, sku, option_summary, name, subtitle, \
     description, manufacturer, brand, upc, quantity, taxable, price, on_sale, sale_price, cost, \
     product_weight, product_height, product_width, product_length, \
     package_weight, package_height, package_width, package_length, quantity_per_package, \
     available_on, created_on, updated_on, archived_on";

const OPTION_COLUMNS: &str = "id, name, product_root_id, created_on, updated_on, archived_on";

const VALUE_COLUMNS: &str = "id, product_option_id, value, created_on, updated_on, archived_on";

const WEBHOOK_COLUMNS: &str =
    "id, url, event_type, content_type, created_on, updated_on, archived_on";

const DISCOUNT_COLUMNS: &str = "id, name, discount_type, amount, starts_on, expires_on, \
     requires_code, code, limited_use, number_of_uses, login_required, \
     created_on, updated_on, archived_on";

/// Postgres-backed catalog store.
#[derive(Debug, Clone)]
pub struct PostgresCatalogStore {
    pool: Arc<PgPool>,
}

impl PostgresCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Fill `values` on each option with its active values.
    async fn attach_values(&self, options: &mut [ProductOption]) -> StoreResult<()> {
        if options.is_empty() {
            return Ok(());
        }
        let ids: Vec<i64> = options.iter().map(|o| o.id.get()).collect();
        let rows = sqlx::query(&format!(
            "SELECT {VALUE_COLUMNS} FROM product_option_values \
             WHERE product_option_id = ANY($1) AND archived_on IS NULL ORDER BY id"
        ))
        .bind(&ids)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_option_values", e))?;

        let mut by_option: HashMap<ProductOptionId, Vec<ProductOptionValue>> = HashMap::new();
        for row in &rows {
            let value = value_from_row(row)?;
            by_option
                .entry(value.product_option_id)
                .or_default()
                .push(value);
        }
        for option in options.iter_mut() {
            option.values = by_option.remove(&option.id).unwrap_or_default();
        }
        Ok(())
    }

    /// Fill `applicable_options` on each product through its active bridges.
    async fn attach_applicable_options(&self, products: &mut [Product]) -> StoreResult<()> {
        if products.is_empty() {
            return Ok(());
        }
        let ids: Vec<i64> = products.iter().map(|p| p.id.get()).collect();
        let rows = sqlx::query(
            r#"
            SELECT
                b.product_id AS bridge_product_id,
                v.id,
                v.product_option_id,
                v.value,
                v.created_on,
                v.updated_on,
                v.archived_on
            FROM product_variant_bridge b
            JOIN product_option_values v ON v.id = b.product_option_value_id
            WHERE b.product_id = ANY($1)
              AND b.archived_on IS NULL
              AND v.archived_on IS NULL
            ORDER BY b.id
            "#,
        )
        .bind(&ids)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_applicable_options", e))?;

        let mut by_product: HashMap<ProductId, Vec<ProductOptionValue>> = HashMap::new();
        for row in &rows {
            let product_id: i64 = row
                .try_get("bridge_product_id")
                .map_err(|e| map_sqlx_error("decode_bridge", e))?;
            by_product
                .entry(ProductId::new(product_id))
                .or_default()
                .push(value_from_row(row)?);
        }
        for product in products.iter_mut() {
            product.applicable_options = by_product.remove(&product.id).unwrap_or_default();
        }
        Ok(())
    }

    async fn count_active(&self, table: &'static str) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {table} WHERE archived_on IS NULL"
        ))
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("count", e))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// One page of active rows from `table`, oldest first.
    async fn page_rows(
        &self,
        table: &'static str,
        columns: &'static str,
        query: ListQuery,
    ) -> StoreResult<(u64, Vec<PgRow>)> {
        let count = self.count_active(table).await?;
        let rows = sqlx::query(&format!(
            "SELECT {columns} FROM {table} WHERE archived_on IS NULL \
             ORDER BY id LIMIT $1 OFFSET $2"
        ))
        .bind(i64::from(query.limit()))
        .bind(i64::try_from(query.offset()).unwrap_or(i64::MAX))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list", e))?;
        Ok((count, rows))
    }

    async fn archive_by_id(
        &self,
        table: &'static str,
        entity: &'static str,
        id: i64,
    ) -> StoreResult<DateTime<Utc>> {
        let archived_on: Option<DateTime<Utc>> = sqlx::query_scalar(&format!(
            "UPDATE {table} SET archived_on = NOW() \
             WHERE id = $1 AND archived_on IS NULL RETURNING archived_on"
        ))
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("archive", e))?;
        archived_on.ok_or_else(|| StoreError::not_found(entity, "id", id))
    }
}

fn page_of<T>(query: ListQuery, count: u64, data: Vec<T>) -> Page<T> {
    Page {
        count,
        page: query.page(),
        limit: query.limit(),
        data,
    }
}

#[async_trait]
impl CatalogStore for PostgresCatalogStore {
    #[instrument(skip(self), err)]
    async fn begin(&self) -> StoreResult<Box<dyn CatalogTransaction>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        Ok(Box::new(PgCatalogTransaction { tx }))
    }

    async fn product_root_with_sku_prefix_exists(&self, sku_prefix: &str) -> StoreResult<bool> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM product_roots
                WHERE sku_prefix = $1 AND archived_on IS NULL
            )
            "#,
        )
        .bind(sku_prefix)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("product_root_with_sku_prefix_exists", e))
    }

    async fn product_root_exists(&self, id: ProductRootId) -> StoreResult<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM product_roots WHERE id = $1 AND archived_on IS NULL)",
        )
        .bind(id.get())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("product_root_exists", e))
    }

    #[instrument(
        skip(self),
        fields(product_root_id = %id, operation = tracing::field::Empty),
        err
    )]
    async fn get_product_root(&self, id: ProductRootId) -> StoreResult<ProductRoot> {
        let span = Span::current();
        span.record("operation", "get_product_root");

        let row = sqlx::query(&format!(
            "SELECT {ROOT_COLUMNS} FROM product_roots WHERE id = $1 AND archived_on IS NULL"
        ))
        .bind(id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_product_root", e))?
        .ok_or_else(|| StoreError::not_found("product root", "id", id))?;
        let mut root = root_from_row(&row)?;

        root.options = self.list_product_options_for_root(id).await?;

        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE product_root_id = $1 AND archived_on IS NULL ORDER BY id"
        ))
        .bind(id.get())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_product_root", e))?;
        let mut products = rows.iter().map(product_from_row).collect::<StoreResult<Vec<_>>>()?;
        self.attach_applicable_options(&mut products).await?;
        root.products = products;

        Ok(root)
    }

    async fn list_product_roots(&self, query: ListQuery) -> StoreResult<Page<ProductRoot>> {
        let (count, rows) = self.page_rows("product_roots", ROOT_COLUMNS, query).await?;
        let data = rows.iter().map(root_from_row).collect::<StoreResult<Vec<_>>>()?;
        Ok(page_of(query, count, data))
    }

    async fn product_with_sku_exists(&self, sku: &str) -> StoreResult<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM products WHERE sku = $1 AND archived_on IS NULL)",
        )
        .bind(sku)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("product_with_sku_exists", e))
    }

    #[instrument(skip(self), err)]
    async fn get_product_by_sku(&self, sku: &str) -> StoreResult<Product> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = $1 AND archived_on IS NULL"
        ))
        .bind(sku)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_product_by_sku", e))?
        .ok_or_else(|| StoreError::not_found("product", "sku", sku))?;
        let mut products = vec![product_from_row(&row)?];
        self.attach_applicable_options(&mut products).await?;
        products
            .pop()
            .ok_or_else(|| StoreError::not_found("product", "sku", sku))
    }

    async fn list_products(&self, query: ListQuery) -> StoreResult<Page<Product>> {
        let (count, rows) = self.page_rows("products", PRODUCT_COLUMNS, query).await?;
        let mut data = rows.iter().map(product_from_row).collect::<StoreResult<Vec<_>>>()?;
        self.attach_applicable_options(&mut data).await?;
        Ok(page_of(query, count, data))
    }

    #[instrument(skip(self, product), fields(product_id = %product.id), err)]
    async fn update_product(&self, product: &Product) -> StoreResult<DateTime<Utc>> {
        let d = &product.details;
        let p = &d.physical;
        let updated_on: Option<DateTime<Utc>> = sqlx::query_scalar(
            r#"
            UPDATE products SET
                sku = $2,
                name = $3,
                subtitle = $4,
                description = $5,
                manufacturer = $6,
                brand = $7,
                upc = $8,
                quantity = $9,
                taxable = $10,
                price = $11,
                on_sale = $12,
                sale_price = $13,
                cost = $14,
                product_weight = $15,
                product_height = $16,
                product_width = $17,
                product_length = $18,
                package_weight = $19,
                package_height = $20,
                package_width = $21,
                package_length = $22,
                quantity_per_package = $23,
                available_on = $24,
                updated_on = NOW()
            WHERE id = $1 AND archived_on IS NULL
            RETURNING updated_on
            "#,
        )
        .bind(product.id.get())
        .bind(&product.sku)
        .bind(&d.name)
        .bind(&d.subtitle)
        .bind(&d.description)
        .bind(&d.manufacturer)
        .bind(&d.brand)
        .bind(&d.upc)
        .bind(d.quantity)
        .bind(d.taxable)
        .bind(d.price)
        .bind(d.on_sale)
        .bind(d.sale_price)
        .bind(d.cost)
        .bind(p.product_weight)
        .bind(p.product_height)
        .bind(p.product_width)
        .bind(p.product_length)
        .bind(p.package_weight)
        .bind(p.package_height)
        .bind(p.package_width)
        .bind(p.package_length)
        .bind(d.quantity_per_package)
        .bind(d.available_on)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_product", e))?;
        updated_on.ok_or_else(|| StoreError::not_found("product", "id", product.id))
    }

    async fn get_product_option(&self, id: ProductOptionId) -> StoreResult<ProductOption> {
        let row = sqlx::query(&format!(
            "SELECT {OPTION_COLUMNS} FROM product_options WHERE id = $1 AND archived_on IS NULL"
        ))
        .bind(id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_product_option", e))?
        .ok_or_else(|| StoreError::not_found("product option", "id", id))?;
        let mut options = vec![option_from_row(&row)?];
        self.attach_values(&mut options).await?;
        options
            .pop()
            .ok_or_else(|| StoreError::not_found("product option", "id", id))
    }

    async fn list_product_options_for_root(
        &self,
        root_id: ProductRootId,
    ) -> StoreResult<Vec<ProductOption>> {
        let rows = sqlx::query(&format!(
            "SELECT {OPTION_COLUMNS} FROM product_options \
             WHERE product_root_id = $1 AND archived_on IS NULL ORDER BY id"
        ))
        .bind(root_id.get())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_product_options_for_root", e))?;
        let mut options = rows.iter().map(option_from_row).collect::<StoreResult<Vec<_>>>()?;
        self.attach_values(&mut options).await?;
        Ok(options)
    }

    async fn product_option_with_name_exists_for_root(
        &self,
        name: &str,
        root_id: ProductRootId,
    ) -> StoreResult<bool> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM product_options
                WHERE name = $1 AND product_root_id = $2 AND archived_on IS NULL
            )
            "#,
        )
        .bind(name)
        .bind(root_id.get())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("product_option_with_name_exists_for_root", e))
    }

    async fn update_product_option(
        &self,
        id: ProductOptionId,
        name: &str,
    ) -> StoreResult<DateTime<Utc>> {
        let updated_on: Option<DateTime<Utc>> = sqlx::query_scalar(
            r#"
            UPDATE product_options SET name = $2, updated_on = NOW()
            WHERE id = $1 AND archived_on IS NULL
            RETURNING updated_on
            "#,
        )
        .bind(id.get())
        .bind(name)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_product_option", e))?;
        updated_on.ok_or_else(|| StoreError::not_found("product option", "id", id))
    }

    async fn get_product_option_value(
        &self,
        id: ProductOptionValueId,
    ) -> StoreResult<ProductOptionValue> {
        let row = sqlx::query(&format!(
            "SELECT {VALUE_COLUMNS} FROM product_option_values \
             WHERE id = $1 AND archived_on IS NULL"
        ))
        .bind(id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_product_option_value", e))?
        .ok_or_else(|| StoreError::not_found("product option value", "id", id))?;
        value_from_row(&row)
    }

    async fn product_option_value_exists_for_option(
        &self,
        option_id: ProductOptionId,
        value: &str,
    ) -> StoreResult<bool> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM product_option_values
                WHERE product_option_id = $1 AND value = $2 AND archived_on IS NULL
            )
            "#,
        )
        .bind(option_id.get())
        .bind(value)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("product_option_value_exists_for_option", e))
    }

    async fn update_product_option_value(
        &self,
        id: ProductOptionValueId,
        value: &str,
    ) -> StoreResult<DateTime<Utc>> {
        let updated_on: Option<DateTime<Utc>> = sqlx::query_scalar(
            r#"
            UPDATE product_option_values SET value = $2, updated_on = NOW()
            WHERE id = $1 AND archived_on IS NULL
            RETURNING updated_on
            "#,
        )
        .bind(id.get())
        .bind(value)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_product_option_value", e))?;
        updated_on.ok_or_else(|| StoreError::not_found("product option value", "id", id))
    }

    async fn archive_product_option_value(
        &self,
        id: ProductOptionValueId,
    ) -> StoreResult<DateTime<Utc>> {
        self.archive_by_id("product_option_values", "product option value", id.get())
            .await
    }

    #[instrument(skip(self, webhook), fields(event_type = %webhook.event_type), err)]
    async fn create_webhook(&self, webhook: &NewWebhook) -> StoreResult<Webhook> {
        let row = sqlx::query(&format!(
            "INSERT INTO webhooks (url, event_type, content_type) VALUES ($1, $2, $3) \
             RETURNING {WEBHOOK_COLUMNS}"
        ))
        .bind(&webhook.url)
        .bind(webhook.event_type.as_str())
        .bind(&webhook.content_type)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_webhook", e))?;
        webhook_from_row(&row)
    }

    async fn get_webhook(&self, id: WebhookId) -> StoreResult<Webhook> {
        let row = sqlx::query(&format!(
            "SELECT {WEBHOOK_COLUMNS} FROM webhooks WHERE id = $1 AND archived_on IS NULL"
        ))
        .bind(id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_webhook", e))?
        .ok_or_else(|| StoreError::not_found("webhook", "id", id))?;
        webhook_from_row(&row)
    }

    async fn list_webhooks(&self, query: ListQuery) -> StoreResult<Page<Webhook>> {
        let (count, rows) = self.page_rows("webhooks", WEBHOOK_COLUMNS, query).await?;
        let data = rows.iter().map(webhook_from_row).collect::<StoreResult<Vec<_>>>()?;
        Ok(page_of(query, count, data))
    }

    async fn list_webhooks_for_event(
        &self,
        event_type: CatalogEventType,
    ) -> StoreResult<Vec<Webhook>> {
        let rows = sqlx::query(&format!(
            "SELECT {WEBHOOK_COLUMNS} FROM webhooks \
             WHERE event_type = $1 AND archived_on IS NULL ORDER BY id"
        ))
        .bind(event_type.as_str())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_webhooks_for_event", e))?;
        rows.iter().map(webhook_from_row).collect()
    }

    async fn update_webhook(&self, webhook: &Webhook) -> StoreResult<DateTime<Utc>> {
        let updated_on: Option<DateTime<Utc>> = sqlx::query_scalar(
            r#"
            UPDATE webhooks SET url = $2, event_type = $3, content_type = $4, updated_on = NOW()
            WHERE id = $1 AND archived_on IS NULL
            RETURNING updated_on
            "#,
        )
        .bind(webhook.id.get())
        .bind(&webhook.url)
        .bind(webhook.event_type.as_str())
        .bind(&webhook.content_type)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_webhook", e))?;
        updated_on.ok_or_else(|| StoreError::not_found("webhook", "id", webhook.id))
    }

    async fn archive_webhook(&self, id: WebhookId) -> StoreResult<DateTime<Utc>> {
        self.archive_by_id("webhooks", "webhook", id.get()).await
    }

    async fn create_webhook_execution_log(&self, log: &WebhookExecutionLog) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO webhook_execution_logs (webhook_id, status_code, succeeded, executed_on)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(log.webhook_id.get())
        .bind(i32::from(log.status_code))
        .bind(log.succeeded)
        .bind(log.executed_on)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_webhook_execution_log", e))?;
        Ok(())
    }

    async fn list_webhook_execution_logs(
        &self,
        webhook_id: WebhookId,
    ) -> StoreResult<Vec<WebhookExecutionLog>> {
        let rows = sqlx::query(
            r#"
            SELECT webhook_id, status_code, succeeded, executed_on
            FROM webhook_execution_logs
            WHERE webhook_id = $1
            ORDER BY id
            "#,
        )
        .bind(webhook_id.get())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_webhook_execution_logs", e))?;
        rows.iter().map(execution_log_from_row).collect()
    }

    #[instrument(skip(self, discount), fields(discount_name = %discount.name), err)]
    async fn create_discount(&self, discount: &NewDiscount) -> StoreResult<Discount> {
        let row = sqlx::query(&format!(
            "INSERT INTO discounts (name, discount_type, amount, starts_on, expires_on, \
             requires_code, code, limited_use, number_of_uses, login_required) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {DISCOUNT_COLUMNS}"
        ))
        .bind(&discount.name)
        .bind(discount.discount_type.as_str())
        .bind(discount.amount)
        .bind(discount.starts_on)
        .bind(discount.expires_on)
        .bind(discount.requires_code)
        .bind(&discount.code)
        .bind(discount.limited_use)
        .bind(discount.number_of_uses)
        .bind(discount.login_required)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_discount", e))?;
        discount_from_row(&row)
    }

    async fn get_discount(&self, id: DiscountId) -> StoreResult<Discount> {
        let row = sqlx::query(&format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE id = $1 AND archived_on IS NULL"
        ))
        .bind(id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_discount", e))?
        .ok_or_else(|| StoreError::not_found("discount", "id", id))?;
        discount_from_row(&row)
    }

    async fn list_discounts(&self, query: ListQuery) -> StoreResult<Page<Discount>> {
        let (count, rows) = self.page_rows("discounts", DISCOUNT_COLUMNS, query).await?;
        let data = rows.iter().map(discount_from_row).collect::<StoreResult<Vec<_>>>()?;
        Ok(page_of(query, count, data))
    }

    async fn update_discount(&self, discount: &Discount) -> StoreResult<DateTime<Utc>> {
        let updated_on: Option<DateTime<Utc>> = sqlx::query_scalar(
            r#"
            UPDATE discounts SET
                name = $2,
                discount_type = $3,
                amount = $4,
                starts_on = $5,
                expires_on = $6,
                requires_code = $7,
                code = $8,
                limited_use = $9,
                number_of_uses = $10,
                login_required = $11,
                updated_on = NOW()
            WHERE id = $1 AND archived_on IS NULL
            RETURNING updated_on
            "#,
        )
        .bind(discount.id.get())
        .bind(&discount.name)
        .bind(discount.discount_type.as_str())
        .bind(discount.amount)
        .bind(discount.starts_on)
        .bind(discount.expires_on)
        .bind(discount.requires_code)
        .bind(&discount.code)
        .bind(discount.limited_use)
        .bind(discount.number_of_uses)
        .bind(discount.login_required)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_discount", e))?;
        updated_on.ok_or_else(|| StoreError::not_found("discount", "id", discount.id))
    }

    async fn archive_discount(&self, id: DiscountId) -> StoreResult<DateTime<Utc>> {
        self.archive_by_id("discounts", "discount", id.get()).await
    }
}

/// One open database transaction.
pub struct PgCatalogTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl CatalogTransaction for PgCatalogTransaction {
    #[instrument(skip(self, root), fields(sku_prefix = %root.sku_prefix), err)]
    async fn create_product_root(
        &mut self,
        root: &NewProductRoot,
    ) -> StoreResult<(ProductRootId, DateTime<Utc>)> {
        let p = &root.physical;
        let row = sqlx::query(&format!(
            "INSERT INTO product_roots (sku_prefix, name, subtitle, description, manufacturer, \
             brand, taxable, cost, {PHYSICAL_COLUMNS}, quantity_per_package, available_on) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18) \
             RETURNING id, created_on"
        ))
        .bind(&root.sku_prefix)
        .bind(&root.name)
        .bind(&root.subtitle)
        .bind(&root.description)
        .bind(&root.manufacturer)
        .bind(&root.brand)
        .bind(root.taxable)
        .bind(root.cost)
        .bind(p.product_weight)
        .bind(p.product_height)
        .bind(p.product_width)
        .bind(p.product_length)
        .bind(p.package_weight)
        .bind(p.package_height)
        .bind(p.package_width)
        .bind(p.package_length)
        .bind(root.quantity_per_package)
        .bind(root.available_on)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("create_product_root", e))?;
        Ok((
            ProductRootId::new(column(&row, "id")?),
            column(&row, "created_on")?,
        ))
    }

    async fn create_product_option(
        &mut self,
        root_id: ProductRootId,
        name: &str,
    ) -> StoreResult<(ProductOptionId, DateTime<Utc>)> {
        let row = sqlx::query(
            "INSERT INTO product_options (name, product_root_id) VALUES ($1, $2) \
             RETURNING id, created_on",
        )
        .bind(name)
        .bind(root_id.get())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("create_product_option", e))?;
        Ok((
            ProductOptionId::new(column(&row, "id")?),
            column(&row, "created_on")?,
        ))
    }

    async fn create_product_option_value(
        &mut self,
        option_id: ProductOptionId,
        value: &str,
    ) -> StoreResult<(ProductOptionValueId, DateTime<Utc>)> {
        let row = sqlx::query(
            "INSERT INTO product_option_values (product_option_id, value) VALUES ($1, $2) \
             RETURNING id, created_on",
        )
        .bind(option_id.get())
        .bind(value)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("create_product_option_value", e))?;
        Ok((
            ProductOptionValueId::new(column(&row, "id")?),
            column(&row, "created_on")?,
        ))
    }

    #[instrument(skip(self, product), fields(sku = %product.sku), err)]
    async fn create_product(
        &mut self,
        product: &NewProduct,
    ) -> StoreResult<(ProductId, DateTime<Utc>, DateTime<Utc>)> {
        let d = &product.details;
        let p = &d.physical;
        let row = sqlx::query(&format!(
            "INSERT INTO products (product_root_id, sku, option_summary, name, subtitle, \
             description, manufacturer, brand, upc, quantity, taxable, price, on_sale, \
             sale_price, cost, {PHYSICAL_COLUMNS}, quantity_per_package, available_on) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, \
             $16, $17, $18, $19, $20, $21, $22, $23, $24, $25) \
             RETURNING id, available_on, created_on"
        ))
        .bind(product.product_root_id.get())
        .bind(&product.sku)
        .bind(&product.option_summary)
        .bind(&d.name)
        .bind(&d.subtitle)
        .bind(&d.description)
        .bind(&d.manufacturer)
        .bind(&d.brand)
        .bind(&d.upc)
        .bind(d.quantity)
        .bind(d.taxable)
        .bind(d.price)
        .bind(d.on_sale)
        .bind(d.sale_price)
        .bind(d.cost)
        .bind(p.product_weight)
        .bind(p.product_height)
        .bind(p.product_width)
        .bind(p.product_length)
        .bind(p.package_weight)
        .bind(p.package_height)
        .bind(p.package_width)
        .bind(p.package_length)
        .bind(d.quantity_per_package)
        .bind(d.available_on)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("create_product", e))?;
        Ok((
            ProductId::new(column(&row, "id")?),
            column(&row, "available_on")?,
            column(&row, "created_on")?,
        ))
    }

    async fn create_multiple_product_variant_bridges_for_product_id(
        &mut self,
        product_id: ProductId,
        option_value_ids: &[ProductOptionValueId],
    ) -> StoreResult<()> {
        let ids: Vec<i64> = option_value_ids.iter().map(|id| id.get()).collect();
        sqlx::query(
            r#"
            INSERT INTO product_variant_bridge (product_id, product_option_value_id)
            SELECT $1, UNNEST($2::BIGINT[])
            "#,
        )
        .bind(product_id.get())
        .bind(&ids)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("create_product_variant_bridges", e))?;
        Ok(())
    }

    async fn archive_product_variant_bridges_for_root(
        &mut self,
        root_id: ProductRootId,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE product_variant_bridge SET archived_on = NOW()
            WHERE archived_on IS NULL
              AND product_id IN (SELECT id FROM products WHERE product_root_id = $1)
            "#,
        )
        .bind(root_id.get())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("archive_product_variant_bridges_for_root", e))?;
        Ok(())
    }

    async fn archive_product_option_values_for_root(
        &mut self,
        root_id: ProductRootId,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE product_option_values SET archived_on = NOW()
            WHERE archived_on IS NULL
              AND product_option_id IN (SELECT id FROM product_options WHERE product_root_id = $1)
            "#,
        )
        .bind(root_id.get())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("archive_product_option_values_for_root", e))?;
        Ok(())
    }

    async fn archive_product_options_for_root(
        &mut self,
        root_id: ProductRootId,
    ) -> StoreResult<()> {
        sqlx::query(
            "UPDATE product_options SET archived_on = NOW() \
             WHERE archived_on IS NULL AND product_root_id = $1",
        )
        .bind(root_id.get())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("archive_product_options_for_root", e))?;
        Ok(())
    }

    async fn archive_products_for_root(&mut self, root_id: ProductRootId) -> StoreResult<()> {
        sqlx::query(
            "UPDATE products SET archived_on = NOW() \
             WHERE archived_on IS NULL AND product_root_id = $1",
        )
        .bind(root_id.get())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("archive_products_for_root", e))?;
        Ok(())
    }

    async fn archive_product_root(
        &mut self,
        root_id: ProductRootId,
    ) -> StoreResult<DateTime<Utc>> {
        let archived_on: Option<DateTime<Utc>> = sqlx::query_scalar(
            "UPDATE product_roots SET archived_on = NOW() \
             WHERE id = $1 AND archived_on IS NULL RETURNING archived_on",
        )
        .bind(root_id.get())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("archive_product_root", e))?;
        archived_on.ok_or_else(|| StoreError::not_found("product root", "id", root_id))
    }

    async fn archive_product_option_values_for_option(
        &mut self,
        option_id: ProductOptionId,
    ) -> StoreResult<()> {
        sqlx::query(
            "UPDATE product_option_values SET archived_on = NOW() \
             WHERE archived_on IS NULL AND product_option_id = $1",
        )
        .bind(option_id.get())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("archive_product_option_values_for_option", e))?;
        Ok(())
    }

    async fn archive_product_option(
        &mut self,
        option_id: ProductOptionId,
    ) -> StoreResult<DateTime<Utc>> {
        let archived_on: Option<DateTime<Utc>> = sqlx::query_scalar(
            "UPDATE product_options SET archived_on = NOW() \
             WHERE id = $1 AND archived_on IS NULL RETURNING archived_on",
        )
        .bind(option_id.get())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("archive_product_option", e))?;
        archived_on.ok_or_else(|| StoreError::not_found("product option", "id", option_id))
    }

    async fn delete_product_variant_bridges_for_product(
        &mut self,
        product_id: ProductId,
    ) -> StoreResult<()> {
        sqlx::query("DELETE FROM product_variant_bridge WHERE product_id = $1")
            .bind(product_id.get())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_product_variant_bridges_for_product", e))?;
        Ok(())
    }

    async fn archive_product(&mut self, product_id: ProductId) -> StoreResult<DateTime<Utc>> {
        let archived_on: Option<DateTime<Utc>> = sqlx::query_scalar(
            "UPDATE products SET archived_on = NOW() \
             WHERE id = $1 AND archived_on IS NULL RETURNING archived_on",
        )
        .bind(product_id.get())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("archive_product", e))?;
        archived_on.ok_or_else(|| StoreError::not_found("product", "id", product_id))
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| map_sqlx_error("rollback", e))
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::UniqueViolation(unique_violation_message(
                    db_err.constraint(),
                    &msg,
                )),
                // foreign key (23503), check (23514) and anything else
                _ => StoreError::Storage(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Storage(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::RowNotFound => {
            StoreError::Storage(format!("unexpected row not found in {operation}"))
        }
        _ => StoreError::Storage(format!("sqlx error in {operation}: {err}")),
    }
}

/// Client-facing text for the partial unique indexes in `migrations/`.
fn unique_violation_message(constraint: Option<&str>, fallback: &str) -> String {
    match constraint {
        Some("product_roots_sku_prefix_active_idx") => {
            "a product with this sku prefix already exists".to_string()
        }
        Some("products_sku_active_idx") => "a product with this sku already exists".to_string(),
        Some("product_options_name_active_idx") => {
            "a product option with this name already exists".to_string()
        }
        Some("product_option_values_value_active_idx") => {
            "this product option value already exists".to_string()
        }
        _ => fallback.to_string(),
    }
}

// row decoding

fn column<'r, T>(row: &'r PgRow, name: &str) -> StoreResult<T>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(name)
        .map_err(|e| map_sqlx_error("decode_row", e))
}

fn physical_from_row(row: &PgRow) -> StoreResult<PhysicalAttributes> {
    Ok(PhysicalAttributes {
        product_weight: column(row, "product_weight")?,
        product_height: column(row, "product_height")?,
        product_width: column(row, "product_width")?,
        product_length: column(row, "product_length")?,
        package_weight: column(row, "package_weight")?,
        package_height: column(row, "package_height")?,
        package_width: column(row, "package_width")?,
        package_length: column(row, "package_length")?,
    })
}

fn root_from_row(row: &PgRow) -> StoreResult<ProductRoot> {
    Ok(ProductRoot {
        id: ProductRootId::new(column(row, "id")?),
        sku_prefix: column(row, "sku_prefix")?,
        name: column(row, "name")?,
        subtitle: column(row, "subtitle")?,
        description: column(row, "description")?,
        manufacturer: column(row, "manufacturer")?,
        brand: column(row, "brand")?,
        taxable: column(row, "taxable")?,
        cost: column(row, "cost")?,
        physical: physical_from_row(row)?,
        quantity_per_package: column(row, "quantity_per_package")?,
        available_on: column(row, "available_on")?,
        created_on: column(row, "created_on")?,
        updated_on: column(row, "updated_on")?,
        archived_on: column(row, "archived_on")?,
        options: Vec::new(),
        products: Vec::new(),
    })
}

fn product_from_row(row: &PgRow) -> StoreResult<Product> {
    Ok(Product {
        id: ProductId::new(column(row, "id")?),
        product_root_id: ProductRootId::new(column(row, "product_root_id")?),
        sku: column(row, "sku")?,
        option_summary: column(row, "option_summary")?,
        details: ProductDetails {
            name: column(row, "name")?,
            subtitle: column(row, "subtitle")?,
            description: column(row, "description")?,
            manufacturer: column(row, "manufacturer")?,
            brand: column(row, "brand")?,
            upc: column(row, "upc")?,
            quantity: column(row, "quantity")?,
            taxable: column(row, "taxable")?,
            price: column(row, "price")?,
            on_sale: column(row, "on_sale")?,
            sale_price: column(row, "sale_price")?,
            cost: column(row, "cost")?,
            physical: physical_from_row(row)?,
            quantity_per_package: column(row, "quantity_per_package")?,
            available_on: column(row, "available_on")?,
        },
        applicable_options: Vec::new(),
        created_on: column(row, "created_on")?,
        updated_on: column(row, "updated_on")?,
        archived_on: column(row, "archived_on")?,
    })
}

fn option_from_row(row: &PgRow) -> StoreResult<ProductOption> {
    Ok(ProductOption {
        id: ProductOptionId::new(column(row, "id")?),
        name: column(row, "name")?,
        product_root_id: ProductRootId::new(column(row, "product_root_id")?),
        values: Vec::new(),
        created_on: column(row, "created_on")?,
        updated_on: column(row, "updated_on")?,
        archived_on: column(row, "archived_on")?,
    })
}

fn value_from_row(row: &PgRow) -> StoreResult<ProductOptionValue> {
    Ok(ProductOptionValue {
        id: ProductOptionValueId::new(column(row, "id")?),
        product_option_id: ProductOptionId::new(column(row, "product_option_id")?),
        value: column(row, "value")?,
        created_on: column(row, "created_on")?,
        updated_on: column(row, "updated_on")?,
        archived_on: column(row, "archived_on")?,
    })
}

fn webhook_from_row(row: &PgRow) -> StoreResult<Webhook> {
    let event_type: String = column(row, "event_type")?;
    Ok(Webhook {
        id: WebhookId::new(column(row, "id")?),
        url: column(row, "url")?,
        event_type: event_type
            .parse()
            .map_err(|e| StoreError::Storage(format!("failed to decode webhook row: {e}")))?,
        content_type: column(row, "content_type")?,
        created_on: column(row, "created_on")?,
        updated_on: column(row, "updated_on")?,
        archived_on: column(row, "archived_on")?,
    })
}

fn execution_log_from_row(row: &PgRow) -> StoreResult<WebhookExecutionLog> {
    let status_code: i32 = column(row, "status_code")?;
    Ok(WebhookExecutionLog {
        webhook_id: WebhookId::new(column(row, "webhook_id")?),
        status_code: u16::try_from(status_code).map_err(|_| {
            StoreError::Storage(format!("status code {status_code} out of range"))
        })?,
        succeeded: column(row, "succeeded")?,
        executed_on: column(row, "executed_on")?,
    })
}

fn discount_from_row(row: &PgRow) -> StoreResult<Discount> {
    let discount_type: String = column(row, "discount_type")?;
    Ok(Discount {
        id: DiscountId::new(column(row, "id")?),
        name: column(row, "name")?,
        discount_type: discount_type
            .parse::<DiscountType>()
            .map_err(|e| StoreError::Storage(format!("failed to decode discount row: {e}")))?,
        amount: column(row, "amount")?,
        starts_on: column(row, "starts_on")?,
        expires_on: column(row, "expires_on")?,
        requires_code: column(row, "requires_code")?,
        code: column(row, "code")?,
        limited_use: column(row, "limited_use")?,
        number_of_uses: column(row, "number_of_uses")?,
        login_required: column(row, "login_required")?,
        created_on: column(row, "created_on")?,
        updated_on: column(row, "updated_on")?,
        archived_on: column(row, "archived_on")?,
    })
}
