//! Service wiring: picks a catalog store and builds the webhook notifier.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use storefront_infra::catalog_store::{CatalogStore, InMemoryCatalogStore, PostgresCatalogStore};
use storefront_infra::webhooks::{HttpWebhookExecutor, WebhookError, WebhookNotifier};
use storefront_infra::{db, AppConfig, CatalogService};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("database migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("webhook client setup failed: {0}")]
    Webhook(#[from] WebhookError),
}

/// Everything the handlers reach through `Extension<Arc<AppServices>>`.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: CatalogService,
}

impl AppServices {
    /// Wire the catalog on top of `store`, delivering webhooks over HTTP.
    pub fn with_store(
        store: Arc<dyn CatalogStore>,
        webhook_timeout: Duration,
    ) -> Result<Self, StartupError> {
        let executor = Arc::new(HttpWebhookExecutor::new(webhook_timeout)?);
        let notifier = WebhookNotifier::new(Arc::clone(&store), executor);
        Ok(Self {
            catalog: CatalogService::new(store, notifier),
        })
    }

    pub fn in_memory(webhook_timeout: Duration) -> Result<Self, StartupError> {
        Self::with_store(Arc::new(InMemoryCatalogStore::new()), webhook_timeout)
    }
}

/// Postgres when `DATABASE_URL` is configured, otherwise an in-memory store.
pub async fn build_services(config: &AppConfig) -> Result<AppServices, StartupError> {
    let Some(url) = config.database_url.as_deref() else {
        warn!("DATABASE_URL not set; using in-memory catalog store (data is lost on restart)");
        return AppServices::in_memory(config.webhook_timeout);
    };

    let pool = db::connect(url, config).await?;
    if config.run_migrations {
        db::run_migrations(&pool).await?;
    }
    info!(
        max_connections = config.database_max_connections,
        "connected to postgres catalog store"
    );

    AppServices::with_store(
        Arc::new(PostgresCatalogStore::new(pool)),
        config.webhook_timeout,
    )
}
