use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use wirebroker::broker::handlers::ApiVersionsHandler;
use wirebroker::broker::{run_listener, HandlerRegistry, ListenerSettings};
use wirebroker::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("invalid configuration")?;

    let mut registry = HandlerRegistry::new();
    registry
        .register(Box::new(ApiVersionsHandler::new()))
        .context("failed to build handler registry")?;
    let registry = Arc::new(registry);
    info!(apis = registry.len(), "handler registry built");

    let listener = TcpListener::bind(config.listen_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr()))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, shutting down");
            let _ = shutdown_tx.send(true);
        }
    });

    let settings = ListenerSettings {
        max_frame_size: config.max_frame_size,
        log_connections: config.log_connections,
    };
    run_listener(listener, registry, settings, shutdown_rx).await;
    info!("broker stopped");
    Ok(())
}
