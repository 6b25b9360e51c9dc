use std::sync::Arc;

use pillbox_api::{config::Config, router, AppState};
use pillbox_domain::{medications::Registry, SystemClock};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env()?;

    let registry = Arc::new(Registry::new(Arc::new(SystemClock)));
    let app = router(AppState::new(registry, config.summary));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Pillbox listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
