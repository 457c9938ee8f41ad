//! Integration tests for the catalog pipeline.
//!
//! Tests: HTTP-free service calls → ProductCreationWorkflow → CatalogStore → WebhookNotifier
//!
//! Verifies:
//! - Creation persists the full Cartesian family, in deterministic order
//! - A failure at any step leaves nothing behind
//! - Duplicate SKU prefixes are rejected, sequentially and concurrently
//! - Webhooks fire only after commit and every exchange is logged

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;

    use storefront_catalog::{OptionInput, ProductCreationInput, ProductUpdate};
    use storefront_core::{DomainError, ListQuery, WebhookId};
    use storefront_events::{
        CatalogEventType, EventEnvelope, NewWebhook, Webhook, WebhookExecutionLog,
        JSON_CONTENT_TYPE,
    };

    use crate::catalog_service::CatalogService;
    use crate::catalog_store::{CatalogStore, InMemoryCatalogStore, InjectedFailure};
    use crate::error::CatalogError;
    use crate::product_creation::CreationState;
    use crate::webhooks::{WebhookError, WebhookExecutor, WebhookNotifier};

    /// Answers every delivery with a fixed status and remembers what it saw.
    struct RecordingExecutor {
        status: u16,
        seen: Mutex<Vec<(WebhookId, CatalogEventType, serde_json::Value)>>,
    }

    impl RecordingExecutor {
        fn new(status: u16) -> Self {
            Self {
                status,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn seen(&self) -> Vec<(WebhookId, CatalogEventType, serde_json::Value)> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WebhookExecutor for RecordingExecutor {
        async fn execute(
            &self,
            webhook: &Webhook,
            envelope: &EventEnvelope,
        ) -> Result<u16, WebhookError> {
            self.seen.lock().unwrap().push((
                webhook.id,
                envelope.event_type(),
                envelope.payload().clone(),
            ));
            Ok(self.status)
        }
    }

    fn setup_with_status(status: u16) -> (InMemoryCatalogStore, Arc<RecordingExecutor>, CatalogService) {
        let store = InMemoryCatalogStore::new();
        let executor = Arc::new(RecordingExecutor::new(status));
        let shared: Arc<dyn CatalogStore> = Arc::new(store.clone());
        let notifier = WebhookNotifier::new(shared.clone(), executor.clone());
        (store, executor, CatalogService::new(shared, notifier))
    }

    fn setup() -> (InMemoryCatalogStore, Arc<RecordingExecutor>, CatalogService) {
        setup_with_status(200)
    }

    fn tshirt_input() -> ProductCreationInput {
        serde_json::from_value(json!({
            "sku": "t-shirt",
            "name": "T-Shirt",
            "price": 12.5,
            "quantity": 10,
            "options": [
                { "name": "Size", "values": ["small", "medium", "large"] },
                { "name": "Color", "values": ["red", "green", "blue"] }
            ]
        }))
        .unwrap()
    }

    fn plain_input(sku: &str) -> ProductCreationInput {
        serde_json::from_value(json!({
            "sku": sku,
            "name": "Mug",
            "price": 8.0,
            "cost": 2.5,
            "product_weight": 0.4
        }))
        .unwrap()
    }

    async fn register_webhook(service: &CatalogService, event_type: CatalogEventType) -> Webhook {
        service
            .create_webhook(NewWebhook {
                url: "http://hooks.test/catalog".to_string(),
                event_type,
                content_type: JSON_CONTENT_TYPE.to_string(),
            })
            .await
            .unwrap()
    }

    /// Delivery is asynchronous; poll the log until `count` entries show up.
    async fn wait_for_logs(
        service: &CatalogService,
        webhook_id: WebhookId,
        count: usize,
    ) -> Vec<WebhookExecutionLog> {
        for _ in 0..100 {
            let logs = service.list_webhook_executions(webhook_id).await.unwrap();
            if logs.len() >= count {
                return logs;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("timed out waiting for {count} webhook execution logs");
    }

    fn assert_not_found(result: Result<impl std::fmt::Debug, CatalogError>) {
        match result {
            Err(CatalogError::Domain(DomainError::NotFound { .. })) => {}
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn creation_persists_the_full_family_in_order() {
        let (_store, _executor, service) = setup();

        let root = service.create_product(tshirt_input()).await.unwrap();

        assert_eq!(root.sku_prefix, "t-shirt");
        assert_eq!(root.options.len(), 2);
        assert_eq!(root.products.len(), 9);
        let skus: Vec<&str> = root.products.iter().map(|p| p.sku.as_str()).collect();
        assert_eq!(
            &skus[..4],
            &[
                "t-shirt_small_red",
                "t-shirt_small_green",
                "t-shirt_small_blue",
                "t-shirt_medium_red"
            ]
        );
        assert_eq!(root.products[0].option_summary, "Size: small, Color: red");

        let stored = service.get_product_root(root.id).await.unwrap();
        assert_eq!(stored.products.len(), 9);
        assert_eq!(stored.options[0].values.len(), 3);

        let variant = service.get_product("t-shirt_large_blue").await.unwrap();
        let values: Vec<&str> = variant
            .applicable_options
            .iter()
            .map(|v| v.value.as_str())
            .collect();
        assert_eq!(values, ["large", "blue"]);
        assert_eq!(variant.details.price, 12.5);
    }

    #[tokio::test]
    async fn zero_options_yield_one_variant_equal_to_the_template() {
        let (_store, _executor, service) = setup();

        let root = service.create_product(plain_input("mug")).await.unwrap();

        assert!(root.options.is_empty());
        assert_eq!(root.products.len(), 1);
        let product = &root.products[0];
        assert_eq!(product.sku, "mug");
        assert_eq!(product.option_summary, "");
        assert_eq!(product.details.name, "Mug");
        assert_eq!(product.details.price, 8.0);
        assert_eq!(product.details.cost, 2.5);
        assert_eq!(product.details.physical.product_weight, 0.4);
        assert_eq!(product.details.quantity_per_package, 1);
        assert!(product.applicable_options.is_empty());
        assert_eq!(root.available_on, product.details.available_on);
    }

    #[tokio::test]
    async fn failed_variant_insert_leaves_nothing_behind() {
        let (store, executor, service) = setup();
        register_webhook(&service, CatalogEventType::ProductCreated).await;
        store.set_injected_failure(Some(InjectedFailure::ProductInsert(5)));

        match service.create_product(tshirt_input()).await {
            Err(CatalogError::Creation { state, .. }) => {
                assert_eq!(state, CreationState::OptionsCreated)
            }
            other => panic!("expected creation failure, got {other:?}"),
        }

        assert!(!store.product_root_with_sku_prefix_exists("t-shirt").await.unwrap());
        assert_not_found(service.get_product("t-shirt").await);
        assert_not_found(service.get_product("t-shirt_small_red").await);
        assert_eq!(service.list_product_roots(ListQuery::default()).await.unwrap().count, 0);
        assert_eq!(service.list_products(ListQuery::default()).await.unwrap().count, 0);

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(executor.seen().is_empty(), "no notification after rollback");

        store.set_injected_failure(None);
        let root = service.create_product(tshirt_input()).await.unwrap();
        assert_eq!(root.products.len(), 9);
    }

    #[tokio::test]
    async fn failed_bridge_insert_rolls_back() {
        let (store, _executor, service) = setup();
        store.set_injected_failure(Some(InjectedFailure::BridgeInsert(3)));

        assert!(matches!(
            service.create_product(tshirt_input()).await,
            Err(CatalogError::Creation { .. })
        ));
        assert_eq!(service.list_products(ListQuery::default()).await.unwrap().count, 0);
    }

    #[tokio::test]
    async fn failed_commit_is_an_internal_error() {
        let (store, _executor, service) = setup();
        store.set_injected_failure(Some(InjectedFailure::Commit));

        match service.create_product(plain_input("mug")).await {
            Err(CatalogError::Creation { state, .. }) => {
                assert_eq!(state, CreationState::VariantsCreated)
            }
            other => panic!("expected creation failure, got {other:?}"),
        }
        assert_not_found(service.get_product("mug").await);
    }

    #[tokio::test]
    async fn duplicate_prefix_is_rejected_before_any_write() {
        let (_store, _executor, service) = setup();
        service.create_product(plain_input("mug")).await.unwrap();

        match service.create_product(plain_input("mug")).await {
            Err(CatalogError::Domain(DomainError::AlreadyExists(msg))) => {
                assert_eq!(msg, "product with sku 'mug' already exists")
            }
            other => panic!("expected already exists, got {other:?}"),
        }
        assert_eq!(service.list_product_roots(ListQuery::default()).await.unwrap().count, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_duplicates_create_one_root() {
        let (_store, _executor, service) = setup();

        let attempts: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.create_product(tshirt_input()).await })
            })
            .collect();

        let mut created = 0;
        for attempt in attempts {
            match attempt.await.unwrap() {
                Ok(_) => created += 1,
                Err(CatalogError::Domain(DomainError::AlreadyExists(_))) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(service.list_product_roots(ListQuery::default()).await.unwrap().count, 1);
        assert_eq!(service.list_products(ListQuery::default()).await.unwrap().count, 9);
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_before_the_store() {
        let (_store, _executor, service) = setup();

        let mut input = plain_input("bad sku!");
        assert!(matches!(
            service.create_product(input.clone()).await,
            Err(CatalogError::Domain(DomainError::Validation(_)))
        ));

        input.sku = "mug".to_string();
        input.options = vec![OptionInput::new("Color", ["red", "red"])];
        assert!(matches!(
            service.create_product(input).await,
            Err(CatalogError::Domain(DomainError::Validation(_)))
        ));
        assert_eq!(service.list_product_roots(ListQuery::default()).await.unwrap().count, 0);
    }

    #[tokio::test]
    async fn values_colliding_on_sku_are_rejected_before_the_transaction() {
        let (store, _executor, service) = setup();
        // Reaching the store would surface this as a creation failure instead.
        store.set_injected_failure(Some(InjectedFailure::ProductInsert(1)));

        let mut input = tshirt_input();
        input.options = vec![OptionInput::new("Color", ["Red", "red"])];
        match service.create_product(input).await {
            Err(CatalogError::Domain(DomainError::Validation(msg))) => {
                assert!(msg.contains("map to the same sku"), "{msg}")
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        store.set_injected_failure(None);
        assert_eq!(service.list_product_roots(ListQuery::default()).await.unwrap().count, 0);
        assert_not_found(service.get_product("t-shirt_red").await);
    }

    #[tokio::test]
    async fn product_created_webhook_receives_the_family() {
        let (_store, executor, service) = setup();
        let webhook = register_webhook(&service, CatalogEventType::ProductCreated).await;
        register_webhook(&service, CatalogEventType::ProductArchived).await;

        let root = service.create_product(tshirt_input()).await.unwrap();

        let logs = wait_for_logs(&service, webhook.id, 1).await;
        assert_eq!(logs.len(), 1);
        assert!(logs[0].succeeded);

        let seen = executor.seen();
        assert_eq!(seen.len(), 1, "only the product_created target is called");
        let (id, event_type, payload) = &seen[0];
        assert_eq!(*id, webhook.id);
        assert_eq!(*event_type, CatalogEventType::ProductCreated);
        assert_eq!(payload["sku_prefix"], "t-shirt");
        assert_eq!(payload["products"].as_array().unwrap().len(), root.products.len());
    }

    #[tokio::test]
    async fn rejected_delivery_is_logged_as_failed() {
        let (_store, _executor, service) = setup_with_status(503);
        let webhook = register_webhook(&service, CatalogEventType::ProductCreated).await;

        service.create_product(plain_input("mug")).await.unwrap();

        let logs = wait_for_logs(&service, webhook.id, 1).await;
        assert_eq!(logs[0].status_code, 503);
        assert!(!logs[0].succeeded);
    }

    #[tokio::test]
    async fn archiving_a_root_cascades_and_frees_the_prefix() {
        let (_store, executor, service) = setup();
        let webhook = register_webhook(&service, CatalogEventType::ProductArchived).await;
        let root = service.create_product(tshirt_input()).await.unwrap();

        let archived = service.archive_product_root(root.id).await.unwrap();
        assert!(archived.archived_on.is_some());
        assert!(archived.products.iter().all(|p| p.archived_on.is_some()));

        assert_not_found(service.get_product_root(root.id).await);
        assert_not_found(service.get_product("t-shirt_small_red").await);
        assert_not_found(service.get_product_option(root.options[0].id).await);
        assert_eq!(service.list_products(ListQuery::default()).await.unwrap().count, 0);
        assert_not_found(service.archive_product_root(root.id).await);

        wait_for_logs(&service, webhook.id, 1).await;
        assert_eq!(executor.seen()[0].1, CatalogEventType::ProductArchived);

        let again = service.create_product(tshirt_input()).await.unwrap();
        assert_ne!(again.id, root.id);
    }

    #[tokio::test]
    async fn archiving_a_product_unlinks_it() {
        let (_store, _executor, service) = setup();
        let root = service.create_product(tshirt_input()).await.unwrap();

        let archived = service.archive_product("t-shirt_small_red").await.unwrap();
        assert!(archived.archived_on.is_some());
        assert_not_found(service.get_product("t-shirt_small_red").await);

        let remaining = service.get_product_root(root.id).await.unwrap();
        assert_eq!(remaining.products.len(), 8);
        assert_eq!(remaining.options.len(), 2);
    }

    #[tokio::test]
    async fn product_updates_keep_skus_unique() {
        let (_store, executor, service) = setup();
        let webhook = register_webhook(&service, CatalogEventType::ProductUpdated).await;
        service.create_product(tshirt_input()).await.unwrap();

        let clash = ProductUpdate {
            sku: Some("t-shirt_small_green".to_string()),
            ..ProductUpdate::default()
        };
        assert!(matches!(
            service.update_product("t-shirt_small_red", clash).await,
            Err(CatalogError::Domain(DomainError::AlreadyExists(_)))
        ));

        let invalid = ProductUpdate {
            sku: Some("no spaces allowed".to_string()),
            ..ProductUpdate::default()
        };
        assert!(matches!(
            service.update_product("t-shirt_small_red", invalid).await,
            Err(CatalogError::Domain(DomainError::Validation(_)))
        ));

        let rename = ProductUpdate {
            sku: Some("t-shirt_tiny_red".to_string()),
            price: Some(9.99),
            ..ProductUpdate::default()
        };
        let updated = service.update_product("t-shirt_small_red", rename).await.unwrap();
        assert!(updated.updated_on.is_some());
        assert_eq!(service.get_product("t-shirt_tiny_red").await.unwrap().details.price, 9.99);

        wait_for_logs(&service, webhook.id, 1).await;
        assert_eq!(executor.seen().len(), 1);
    }

    #[tokio::test]
    async fn options_and_values_on_existing_roots() {
        let (_store, _executor, service) = setup();
        let root = service.create_product(plain_input("mug")).await.unwrap();

        let option = service
            .create_option(root.id, OptionInput::new("Finish", ["matte", "gloss"]))
            .await
            .unwrap();
        assert_eq!(option.values.len(), 2);
        assert_eq!(
            service.get_product_root(root.id).await.unwrap().products.len(),
            1,
            "existing variants are not regenerated"
        );

        match service
            .create_option(root.id, OptionInput::new("Finish", ["satin"]))
            .await
        {
            Err(CatalogError::Domain(DomainError::AlreadyExists(msg))) => {
                assert_eq!(msg, "product option with the name 'Finish' already exists")
            }
            other => panic!("expected already exists, got {other:?}"),
        }
        assert_not_found(
            service
                .create_option(
                    storefront_core::ProductRootId::new(9_999),
                    OptionInput::new("Size", ["s"]),
                )
                .await,
        );

        match service.create_option_value(option.id, "matte").await {
            Err(CatalogError::Domain(DomainError::AlreadyExists(msg))) => assert_eq!(
                msg,
                format!("product option value 'matte' already exists for option ID {}", option.id)
            ),
            other => panic!("expected already exists, got {other:?}"),
        }
        let satin = service.create_option_value(option.id, "satin").await.unwrap();
        let renamed = service.update_option_value(satin.id, "silk").await.unwrap();
        assert_eq!(renamed.value, "silk");
        assert!(service.update_option_value(satin.id, "gloss").await.is_err());

        let archived = service.archive_option(option.id).await.unwrap();
        assert!(archived.values.iter().all(|v| v.archived_on.is_some()));
        assert_not_found(service.get_product_option_value(satin.id).await);
        assert!(service.list_options_for_root(root.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn webhook_crud_validates_input() {
        let (_store, _executor, service) = setup();

        let bad = NewWebhook {
            url: "ftp://hooks.test".to_string(),
            event_type: CatalogEventType::ProductCreated,
            content_type: JSON_CONTENT_TYPE.to_string(),
        };
        assert!(matches!(
            service.create_webhook(bad).await,
            Err(CatalogError::Domain(DomainError::Validation(_)))
        ));

        let webhook = register_webhook(&service, CatalogEventType::ProductCreated).await;
        let moved = service
            .update_webhook(
                webhook.id,
                storefront_events::WebhookUpdate {
                    event_type: Some(CatalogEventType::ProductUpdated),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.event_type, CatalogEventType::ProductUpdated);
        assert!(service
            .list_webhooks_for_event(CatalogEventType::ProductCreated)
            .await
            .unwrap()
            .is_empty());

        service.archive_webhook(webhook.id).await.unwrap();
        assert_not_found(service.get_webhook(webhook.id).await);
    }

    /// Runs only when `DATABASE_URL` points at a disposable Postgres database.
    #[tokio::test]
    async fn postgres_store_round_trip() {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            return;
        };
        let config = crate::config::AppConfig::default();
        let pool = crate::db::connect(&url, &config).await.unwrap();
        crate::db::run_migrations(&pool).await.unwrap();

        let store: Arc<dyn CatalogStore> =
            Arc::new(crate::catalog_store::PostgresCatalogStore::new(pool));
        let executor = Arc::new(RecordingExecutor::new(200));
        let service = CatalogService::new(
            store.clone(),
            WebhookNotifier::new(store.clone(), executor),
        );

        // SKUs only allow letters, '-' and '_'
        let prefix: String = uuid::Uuid::now_v7()
            .simple()
            .to_string()
            .chars()
            .map(|c| match c.to_digit(10) {
                Some(d) => char::from(b'a' + d as u8),
                None => c,
            })
            .collect();
        let mut input = tshirt_input();
        input.sku = prefix.clone();

        let root = service.create_product(input.clone()).await.unwrap();
        assert_eq!(root.products.len(), 9);
        let variant = service
            .get_product(&format!("{prefix}_medium_green"))
            .await
            .unwrap();
        assert_eq!(variant.applicable_options.len(), 2);
        assert!(matches!(
            service.create_product(input).await,
            Err(CatalogError::Domain(DomainError::AlreadyExists(_)))
        ));

        service.archive_product_root(root.id).await.unwrap();
        assert_not_found(service.get_product_root(root.id).await);
    }
}
