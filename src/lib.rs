pub mod api;
pub mod authorization;
pub mod config;
pub mod core_state;
pub mod db;
pub mod documents;
pub mod identity;
pub mod models;
pub mod navigation;
pub mod photos;
pub mod staff;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

/// Process entry: logging, configuration, storage, HTTP server, then wait
/// for Ctrl-C and shut down gracefully.
pub async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let settings = config::ServerConfig::from_env()?;
    tracing::info!(?settings, "Configuration loaded");

    let core = Arc::new(core_state::CoreState::initialize(&settings)?);
    let mut server = api::start_server_on(core, settings.bind).await?;
    tracing::info!(addr = %server.addr, "Listening");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    server.shutdown();
    server.stopped().await;

    tracing::info!("{} stopped", config::APP_NAME);
    Ok(())
}
