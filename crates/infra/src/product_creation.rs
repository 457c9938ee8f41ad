//! Product family creation workflow.
//!
//! One request creates a root, its options and values, and every variant in a
//! single transaction:
//!
//! ```text
//! Start -> RootCreated -> OptionsCreated -> VariantsCreated -> Committed -> NotificationsSent
//! ```
//!
//! Any store failure before `Committed` rolls the whole transaction back and is
//! reported as [`CatalogError::Creation`] carrying the last state reached.
//! Notification happens after commit and cannot fail the request.
//!
//! The duplicate SKU prefix check runs before the transaction opens. It can race
//! with a concurrent request; the store's uniqueness constraint on active
//! prefixes rejects the loser at insert or commit time.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, instrument, warn};

use storefront_catalog::{
    combination_count, combinations, materialize_base_variant, materialize_variant, NewProduct,
    Product, ProductCreationInput, ProductOption, ProductOptionValue, ProductRoot,
};
use storefront_core::{DomainError, ProductRootId};
use storefront_events::CatalogEventType;

use crate::catalog_store::{CatalogStore, CatalogTransaction, StoreError, StoreResult};
use crate::error::{CatalogError, CatalogResult};
use crate::webhooks::WebhookNotifier;

/// Progress of one creation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationState {
    Start,
    RootCreated,
    OptionsCreated,
    VariantsCreated,
    Committed,
    NotificationsSent,
}

impl CreationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::RootCreated => "root_created",
            Self::OptionsCreated => "options_created",
            Self::VariantsCreated => "variants_created",
            Self::Committed => "committed",
            Self::NotificationsSent => "notifications_sent",
        }
    }
}

impl fmt::Display for CreationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn advance(state: &mut CreationState, next: CreationState) {
    debug!(from = %state, to = %next, "product creation transition");
    *state = next;
}

/// Map a store failure at `state` to the caller-facing error.
///
/// Uniqueness violations are concurrent duplicates and stay client errors.
fn creation_failure(state: CreationState, source: StoreError) -> CatalogError {
    match source {
        StoreError::UniqueViolation(msg) => DomainError::already_exists(msg).into(),
        source => CatalogError::Creation { state, source },
    }
}

#[derive(Clone)]
pub struct ProductCreationWorkflow {
    store: Arc<dyn CatalogStore>,
    notifier: WebhookNotifier,
}

impl ProductCreationWorkflow {
    pub fn new(store: Arc<dyn CatalogStore>, notifier: WebhookNotifier) -> Self {
        Self { store, notifier }
    }

    /// Create a product family and return it with `options` and `products` populated.
    #[instrument(skip(self, input), fields(sku_prefix = %input.sku), err)]
    pub async fn create(&self, input: ProductCreationInput) -> CatalogResult<ProductRoot> {
        let plan = input.into_plan(Utc::now())?;

        if self
            .store
            .product_root_with_sku_prefix_exists(&plan.sku_prefix)
            .await?
        {
            return Err(DomainError::already_exists(format!(
                "product with sku '{}' already exists",
                plan.sku_prefix
            ))
            .into());
        }

        let mut state = CreationState::Start;
        let mut tx = self
            .store
            .begin()
            .await
            .map_err(|e| creation_failure(state, e))?;

        let root = match build_family(tx.as_mut(), &plan, &mut state).await {
            Ok(root) => root,
            Err(source) => {
                warn!(state = %state, error = %source, "product creation failed, rolling back");
                if let Err(err) = tx.rollback().await {
                    error!(state = %state, error = %err, "rollback failed");
                }
                return Err(creation_failure(state, source));
            }
        };

        if let Err(source) = tx.commit().await {
            warn!(state = %state, error = %source, "product creation commit failed");
            return Err(creation_failure(state, source));
        }
        advance(&mut state, CreationState::Committed);

        match serde_json::to_value(&root) {
            Ok(payload) => {
                self.notifier
                    .dispatch(CatalogEventType::ProductCreated, payload);
            }
            Err(err) => error!(error = %err, "failed to encode product_created payload"),
        }
        advance(&mut state, CreationState::NotificationsSent);

        Ok(root)
    }
}

async fn build_family(
    tx: &mut dyn CatalogTransaction,
    plan: &storefront_catalog::CreationPlan,
    state: &mut CreationState,
) -> StoreResult<ProductRoot> {
    let (root_id, created_on) = tx.create_product_root(&plan.root).await?;
    let mut root = plan.root.clone().into_root(root_id, created_on);
    advance(state, CreationState::RootCreated);

    for option in &plan.options {
        root.options
            .push(insert_option_with_values(tx, root_id, &option.name, &option.values).await?);
    }
    advance(state, CreationState::OptionsCreated);

    let products = if root.options.is_empty() {
        let base = materialize_base_variant(&plan.template, root_id, &plan.sku_prefix);
        vec![persist_variant(tx, base).await?]
    } else {
        let mut products = Vec::with_capacity(combination_count(&root.options));
        for combination in combinations(&root.options) {
            let variant =
                materialize_variant(&plan.template, root_id, &plan.sku_prefix, &combination);
            products.push(persist_variant(tx, variant).await?);
        }
        products
    };
    root.products = products;
    advance(state, CreationState::VariantsCreated);

    Ok(root)
}

/// Insert an option and its values, in the given order.
pub(crate) async fn insert_option_with_values(
    tx: &mut dyn CatalogTransaction,
    root_id: ProductRootId,
    name: &str,
    values: &[String],
) -> StoreResult<ProductOption> {
    let (option_id, created_on) = tx.create_product_option(root_id, name).await?;
    let mut option = ProductOption {
        id: option_id,
        name: name.to_string(),
        product_root_id: root_id,
        values: Vec::with_capacity(values.len()),
        created_on,
        updated_on: None,
        archived_on: None,
    };
    for value in values {
        let (value_id, created_on) = tx.create_product_option_value(option_id, value).await?;
        option.values.push(ProductOptionValue {
            id: value_id,
            product_option_id: option_id,
            value: value.clone(),
            created_on,
            updated_on: None,
            archived_on: None,
        });
    }
    Ok(option)
}

/// Insert one variant and link it to the values that produced it.
pub(crate) async fn persist_variant(
    tx: &mut dyn CatalogTransaction,
    variant: NewProduct,
) -> StoreResult<Product> {
    let (product_id, available_on, created_on) = tx.create_product(&variant).await?;
    let value_ids = variant.option_value_ids();
    if !value_ids.is_empty() {
        tx.create_multiple_product_variant_bridges_for_product_id(product_id, &value_ids)
            .await?;
    }
    Ok(variant.into_product(product_id, available_on, created_on))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_render_as_snake_case() {
        assert_eq!(CreationState::VariantsCreated.to_string(), "variants_created");
        assert_eq!(CreationState::NotificationsSent.as_str(), "notifications_sent");
    }

    #[test]
    fn unique_violation_during_creation_is_a_client_error() {
        let err = creation_failure(
            CreationState::RootCreated,
            StoreError::UniqueViolation("product with sku 'mug' already exists".to_string()),
        );
        assert!(matches!(err, CatalogError::Domain(DomainError::AlreadyExists(_))));
    }

    #[test]
    fn storage_failure_keeps_the_state_reached() {
        let err = creation_failure(
            CreationState::OptionsCreated,
            StoreError::Storage("disk full".to_string()),
        );
        match err {
            CatalogError::Creation { state, .. } => {
                assert_eq!(state, CreationState::OptionsCreated)
            }
            other => panic!("expected creation failure, got {other:?}"),
        }
    }
}
