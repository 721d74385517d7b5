mod analyzer;
mod config;
mod model;
mod normalizer;
mod provider;
mod server;
mod utils;

use analyzer::AnalyzerImpl;
use config::{load_config, AppConfig};
use provider::YahooProvider;
use server::{router, AppState, ENDPOINTS};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "config.json";

#[tokio::main]
async fn main() {
    // Initialize logging, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("😱 Panic occurred: {:?}", panic_info);
    }));

    let config_path =
        std::env::var("STOCK_INSIGHT_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config: AppConfig = match load_config(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Config load error ({}): {}", config_path, e);
            return;
        }
    };

    let provider = match YahooProvider::new(config.provider.clone()) {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to build market data client: {}", e);
            return;
        }
    };
    let state = AppState::new(Arc::new(provider), AnalyzerImpl::new(config.analysis.clone()));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            return;
        }
    };

    info!("🚀 Stock insight service listening on http://{}", addr);
    for (method, path, description) in ENDPOINTS {
        info!("  {:<4} {} - {}", method, path, description);
    }

    if let Err(e) = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
    }
    info!("Server stopped.");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        // never resolve, keep serving
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, finishing in-flight requests...");
}
