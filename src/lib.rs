pub mod api;
pub mod config;
pub mod core_state;
pub mod export;
pub mod models;
pub mod store;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

/// Start the record service and block until Ctrl-C.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = config::AppConfig::from_env()?;
    let core = Arc::new(core_state::CoreState::open(&config.records_file)?);
    tracing::info!(path = %config.records_file.display(), "Patient records file ready");

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let server = api::start_server(core, config.bind_addr, config.allowed_origins).await?;
        tracing::info!(addr = %server.session.server_addr, "Listening");

        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown requested");
        server.stop().await;
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
