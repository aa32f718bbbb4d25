// Binary Pool Market - Main Entry Point

use binary_pool_market::{handlers, AppState, MarketConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match MarketConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };
    config.log_summary();

    let state = AppState::load_or_new(&config).shared();
    let shutdown_state = state.clone();
    let app = handlers::router(state);

    let listener = match tokio::net::TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %config.bind_addr, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };
    tracing::info!(addr = %config.bind_addr, "market API listening");

    let shutdown = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
        tracing::info!("shutdown signal received, saving state");
        if let Err(e) = shutdown_state.read().await.save_to_disk() {
            tracing::error!(error = %e, "failed to save state");
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
    {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}
