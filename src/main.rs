// Initialize logging
// Load configuration
// Build the wallet aggregator (one limiter per upstream host)
// Start HTTP server, stop on Ctrl-C

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wallet_data_service::{api, config::Config, service::WalletAggregator, state::AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting wallet-data-service");

    let config = Config::from_env();
    // Endpoint URLs can embed API keys, so only pacing is logged
    info!(
        "Configuration loaded: spacing={:?}, retries={}, tx limit={}",
        config.min_request_spacing, config.max_retries, config.tx_list_limit
    );

    let wallets = WalletAggregator::from_config(&config)?;
    let app_state = Arc::new(AppState { wallets });

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
        }
        signal.cancel();
    });

    let app = api::create_router(app_state);
    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Starting server on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("Server stopped");
    Ok(())
}
