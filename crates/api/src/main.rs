use std::sync::Arc;

use anyhow::Context;

use storefront_api::app::{build_app, services::build_services};
use storefront_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    storefront_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let services = build_services(&config)
        .await
        .context("failed to start catalog services")?;
    let app = build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
