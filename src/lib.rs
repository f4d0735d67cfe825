pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod pipeline;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use backend::http::HttpImageryClient;

/// Process entry point: logging, backend session bootstrap, server start,
/// shutdown wait.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    // One backend session for the process lifetime, injected everywhere.
    let client = HttpImageryClient::from_env();
    tracing::info!(backend = client.base_url(), "imagery backend session ready");
    let ctx = api::types::ApiContext::new(Arc::new(client));

    let addr = config::bind_addr()?;
    let mut server = api::server::start_api_server(ctx, addr).await?;
    tracing::info!(addr = %server.addr, "ready to serve analysis requests");

    tokio::signal::ctrl_c().await?;
    server.shutdown();
    Ok(())
}
