pub mod commands;
pub mod error;
pub mod models;
pub mod modules;
pub mod proxy; // Reverse proxy service
mod utils;

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use modules::logger;
use modules::token_store::FileTokenStore;
use proxy::{AppState, AxumServer, GatewayObserver, NoopObserver, TracingObserver};

/// Run the gateway until Ctrl-C
pub async fn run() -> anyhow::Result<()> {
    let config = modules::config::load_gateway_config().context("Failed to load config")?;

    // Initialize logger
    let _log_guard = logger::init_logger(&config.logging);

    let store = Arc::new(FileTokenStore::new(&config.token_file));
    info!("Token file: {:?}", store.path());

    let observer: Arc<dyn GatewayObserver> = if config.logging.enabled {
        Arc::new(TracingObserver)
    } else {
        Arc::new(NoopObserver)
    };
    let state = AppState::new(&config, store)?.with_observer(observer);

    let (server, handle) = AxumServer::start(&config.host, config.port, state)
        .await
        .map_err(anyhow::Error::msg)?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown signal received");

    server.stop();
    handle.await.context("Server task failed")?;
    Ok(())
}
