//! League Portal API server

use anyhow::Context;
use league_server::{build_router, AppState, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = ServerConfig::path_from_env();
    let loaded = ServerConfig::load(&config_path)?;
    let config_missing = loaded.is_none();
    let mut config = loaded.unwrap_or_default();
    config.apply_env();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_filter.clone()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config_missing {
        tracing::warn!("Config not found at {}, using defaults", config_path.display());
    }

    let bind_addr = config.bind_addr.clone();
    tracing::info!(data_dir = %config.data_dir.display(), mail = config.mail.enabled, "Starting league portal API");

    let app = build_router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Listening on {}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
