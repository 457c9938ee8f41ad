//! Catalog operations behind the HTTP surface.
//!
//! Every mutation that touches more than one row runs in one store transaction.
//! Events are dispatched only after the change has committed.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, instrument, warn};

use storefront_catalog::{
    Discount, DiscountUpdate, NewDiscount, OptionInput, OptionUpdate, Product,
    ProductCreationInput, ProductOption, ProductOptionValue, ProductRoot, ProductUpdate,
    validate_option_value,
};
use storefront_core::{
    DiscountId, DomainError, ListQuery, Page, ProductOptionId, ProductOptionValueId,
    ProductRootId, WebhookId,
};
use storefront_events::{
    CatalogEventType, NewWebhook, Webhook, WebhookExecutionLog, WebhookUpdate,
};

use crate::catalog_store::{CatalogStore, CatalogTransaction, StoreResult};
use crate::error::CatalogResult;
use crate::product_creation::{insert_option_with_values, ProductCreationWorkflow};
use crate::webhooks::WebhookNotifier;

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    notifier: WebhookNotifier,
    creation: ProductCreationWorkflow,
}

/// Run `work` in a fresh transaction; commit on success, roll back otherwise.
macro_rules! in_transaction {
    ($store:expr, |$tx:ident| $work:expr) => {{
        let mut tx: Box<dyn CatalogTransaction> = $store.begin().await?;
        let outcome: StoreResult<_> = async {
            let $tx = tx.as_mut();
            $work
        }
        .await;
        match outcome {
            Ok(value) => {
                tx.commit().await?;
                Ok::<_, crate::error::CatalogError>(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    error!(error = %rollback_err, "rollback failed");
                }
                Err(err.into())
            }
        }
    }};
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>, notifier: WebhookNotifier) -> Self {
        let creation = ProductCreationWorkflow::new(store.clone(), notifier.clone());
        Self {
            store,
            notifier,
            creation,
        }
    }

    fn notify<T: Serialize>(&self, event_type: CatalogEventType, subject: &T) {
        match serde_json::to_value(subject) {
            Ok(payload) => {
                self.notifier.dispatch(event_type, payload);
            }
            Err(err) => error!(event_type = %event_type, error = %err, "failed to encode event payload"),
        }
    }

    // product roots

    pub async fn list_product_roots(&self, query: ListQuery) -> CatalogResult<Page<ProductRoot>> {
        Ok(self.store.list_product_roots(query).await?)
    }

    pub async fn get_product_root(&self, id: ProductRootId) -> CatalogResult<ProductRoot> {
        Ok(self.store.get_product_root(id).await?)
    }

    /// Archive a root together with its bridges, values, options and products.
    #[instrument(skip(self), fields(product_root_id = %id), err)]
    pub async fn archive_product_root(&self, id: ProductRootId) -> CatalogResult<ProductRoot> {
        let mut root = self.store.get_product_root(id).await?;

        let archived_on = in_transaction!(self.store, |tx| {
            tx.archive_product_variant_bridges_for_root(id).await?;
            tx.archive_product_option_values_for_root(id).await?;
            tx.archive_product_options_for_root(id).await?;
            tx.archive_products_for_root(id).await?;
            tx.archive_product_root(id).await
        })?;

        root.archived_on = Some(archived_on);
        for product in &mut root.products {
            product.archived_on = Some(archived_on);
        }
        for option in &mut root.options {
            option.archived_on = Some(archived_on);
            for value in &mut option.values {
                value.archived_on = Some(archived_on);
            }
        }
        self.notify(CatalogEventType::ProductArchived, &root);
        Ok(root)
    }

    // products

    pub async fn create_product(&self, input: ProductCreationInput) -> CatalogResult<ProductRoot> {
        self.creation.create(input).await
    }

    pub async fn list_products(&self, query: ListQuery) -> CatalogResult<Page<Product>> {
        Ok(self.store.list_products(query).await?)
    }

    pub async fn get_product(&self, sku: &str) -> CatalogResult<Product> {
        Ok(self.store.get_product_by_sku(sku).await?)
    }

    pub async fn product_exists(&self, sku: &str) -> CatalogResult<bool> {
        Ok(self.store.product_with_sku_exists(sku).await?)
    }

    #[instrument(skip(self, update), err)]
    pub async fn update_product(&self, sku: &str, update: ProductUpdate) -> CatalogResult<Product> {
        update.validate()?;
        let mut product = self.store.get_product_by_sku(sku).await?;

        if let Some(new_sku) = update.sku.as_deref() {
            if new_sku != product.sku && self.store.product_with_sku_exists(new_sku).await? {
                return Err(DomainError::already_exists(format!(
                    "product with sku '{new_sku}' already exists"
                ))
                .into());
            }
        }

        update.apply_to(&mut product)?;
        product.updated_on = Some(self.store.update_product(&product).await?);
        self.notify(CatalogEventType::ProductUpdated, &product);
        Ok(product)
    }

    /// Unlink a variant from its option values and archive it.
    #[instrument(skip(self), err)]
    pub async fn archive_product(&self, sku: &str) -> CatalogResult<Product> {
        let mut product = self.store.get_product_by_sku(sku).await?;
        let id = product.id;

        let archived_on = in_transaction!(self.store, |tx| {
            tx.delete_product_variant_bridges_for_product(id).await?;
            tx.archive_product(id).await
        })?;

        product.archived_on = Some(archived_on);
        self.notify(CatalogEventType::ProductArchived, &product);
        Ok(product)
    }

    // options

    pub async fn list_options_for_root(
        &self,
        root_id: ProductRootId,
    ) -> CatalogResult<Vec<ProductOption>> {
        if !self.store.product_root_exists(root_id).await? {
            return Err(DomainError::not_found("product root", "id", root_id).into());
        }
        Ok(self.store.list_product_options_for_root(root_id).await?)
    }

    pub async fn get_product_option(&self, id: ProductOptionId) -> CatalogResult<ProductOption> {
        Ok(self.store.get_product_option(id).await?)
    }

    /// Add an option axis to an existing root.
    ///
    /// Existing variants are left as they are; no new combinations are generated.
    #[instrument(skip(self, input), fields(option_name = %input.name), err)]
    pub async fn create_option(
        &self,
        root_id: ProductRootId,
        input: OptionInput,
    ) -> CatalogResult<ProductOption> {
        input.validate()?;
        if !self.store.product_root_exists(root_id).await? {
            return Err(DomainError::not_found("product root", "id", root_id).into());
        }
        if self
            .store
            .product_option_with_name_exists_for_root(&input.name, root_id)
            .await?
        {
            return Err(DomainError::already_exists(format!(
                "product option with the name '{}' already exists",
                input.name
            ))
            .into());
        }

        in_transaction!(self.store, |tx| {
            insert_option_with_values(tx, root_id, &input.name, &input.values).await
        })
    }

    pub async fn update_option(
        &self,
        id: ProductOptionId,
        update: OptionUpdate,
    ) -> CatalogResult<ProductOption> {
        update.validate()?;
        let mut option = self.store.get_product_option(id).await?;
        if update.name != option.name
            && self
                .store
                .product_option_with_name_exists_for_root(&update.name, option.product_root_id)
                .await?
        {
            return Err(DomainError::already_exists(format!(
                "product option with the name '{}' already exists",
                update.name
            ))
            .into());
        }

        option.updated_on = Some(self.store.update_product_option(id, &update.name).await?);
        option.name = update.name;
        Ok(option)
    }

    /// Archive an option and all of its values.
    pub async fn archive_option(&self, id: ProductOptionId) -> CatalogResult<ProductOption> {
        let mut option = self.store.get_product_option(id).await?;

        let archived_on = in_transaction!(self.store, |tx| {
            tx.archive_product_option_values_for_option(id).await?;
            tx.archive_product_option(id).await
        })?;

        option.archived_on = Some(archived_on);
        for value in &mut option.values {
            value.archived_on = Some(archived_on);
        }
        Ok(option)
    }

    // option values

    pub async fn get_product_option_value(
        &self,
        id: ProductOptionValueId,
    ) -> CatalogResult<ProductOptionValue> {
        Ok(self.store.get_product_option_value(id).await?)
    }

    pub async fn create_option_value(
        &self,
        option_id: ProductOptionId,
        value: &str,
    ) -> CatalogResult<ProductOptionValue> {
        validate_option_value(value)?;
        self.store.get_product_option(option_id).await?;
        self.ensure_value_is_free(option_id, value).await?;

        let (id, created_on) = in_transaction!(self.store, |tx| {
            tx.create_product_option_value(option_id, value).await
        })?;
        Ok(ProductOptionValue {
            id,
            product_option_id: option_id,
            value: value.to_string(),
            created_on,
            updated_on: None,
            archived_on: None,
        })
    }

    pub async fn update_option_value(
        &self,
        id: ProductOptionValueId,
        value: &str,
    ) -> CatalogResult<ProductOptionValue> {
        validate_option_value(value)?;
        let mut current = self.store.get_product_option_value(id).await?;
        if current.value != value {
            self.ensure_value_is_free(current.product_option_id, value)
                .await?;
        }

        current.updated_on = Some(self.store.update_product_option_value(id, value).await?);
        current.value = value.to_string();
        Ok(current)
    }

    pub async fn archive_option_value(
        &self,
        id: ProductOptionValueId,
    ) -> CatalogResult<ProductOptionValue> {
        let mut value = self.store.get_product_option_value(id).await?;
        value.archived_on = Some(self.store.archive_product_option_value(id).await?);
        Ok(value)
    }

    async fn ensure_value_is_free(&self, option_id: ProductOptionId, value: &str) -> CatalogResult<()> {
        if self
            .store
            .product_option_value_exists_for_option(option_id, value)
            .await?
        {
            return Err(DomainError::already_exists(format!(
                "product option value '{value}' already exists for option ID {option_id}"
            ))
            .into());
        }
        Ok(())
    }

    // webhooks

    pub async fn create_webhook(&self, input: NewWebhook) -> CatalogResult<Webhook> {
        input.validate()?;
        Ok(self.store.create_webhook(&input).await?)
    }

    pub async fn get_webhook(&self, id: WebhookId) -> CatalogResult<Webhook> {
        Ok(self.store.get_webhook(id).await?)
    }

    pub async fn list_webhooks(&self, query: ListQuery) -> CatalogResult<Page<Webhook>> {
        Ok(self.store.list_webhooks(query).await?)
    }

    pub async fn list_webhooks_for_event(
        &self,
        event_type: CatalogEventType,
    ) -> CatalogResult<Vec<Webhook>> {
        Ok(self.store.list_webhooks_for_event(event_type).await?)
    }

    pub async fn update_webhook(&self, id: WebhookId, update: WebhookUpdate) -> CatalogResult<Webhook> {
        let mut webhook = self.store.get_webhook(id).await?;
        update.apply_to(&mut webhook)?;
        webhook.updated_on = Some(self.store.update_webhook(&webhook).await?);
        Ok(webhook)
    }

    pub async fn archive_webhook(&self, id: WebhookId) -> CatalogResult<Webhook> {
        let mut webhook = self.store.get_webhook(id).await?;
        webhook.archived_on = Some(self.store.archive_webhook(id).await?);
        Ok(webhook)
    }

    pub async fn list_webhook_executions(
        &self,
        id: WebhookId,
    ) -> CatalogResult<Vec<WebhookExecutionLog>> {
        self.store.get_webhook(id).await?;
        Ok(self.store.list_webhook_execution_logs(id).await?)
    }

    // discounts

    pub async fn create_discount(&self, input: NewDiscount) -> CatalogResult<Discount> {
        input.validate()?;
        Ok(self.store.create_discount(&input).await?)
    }

    pub async fn get_discount(&self, id: DiscountId) -> CatalogResult<Discount> {
        Ok(self.store.get_discount(id).await?)
    }

    pub async fn list_discounts(&self, query: ListQuery) -> CatalogResult<Page<Discount>> {
        Ok(self.store.list_discounts(query).await?)
    }

    pub async fn update_discount(
        &self,
        id: DiscountId,
        update: DiscountUpdate,
    ) -> CatalogResult<Discount> {
        let mut discount = self.store.get_discount(id).await?;
        update.apply_to(&mut discount)?;
        discount.updated_on = Some(self.store.update_discount(&discount).await?);
        Ok(discount)
    }

    pub async fn archive_discount(&self, id: DiscountId) -> CatalogResult<Discount> {
        let mut discount = self.store.get_discount(id).await?;
        let archived_on = self.store.archive_discount(id).await.inspect_err(|err| {
            warn!(discount_id = %id, error = %err, "failed to archive discount");
        })?;
        discount.archived_on = Some(archived_on);
        Ok(discount)
    }
}
