// =============================================================================
// Stock Oracle — Main Entry Point
// =============================================================================
//
// Serves next-day UP/DOWN predictions for stock tickers, computed from the
// last 30 daily closes with a fixed-weight technical indicator vote.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod error;
mod history;
mod indicators;
mod market_data;
mod predictor;
mod runtime_config;
mod signals;
mod ticker;
mod types;

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::runtime_config::RuntimeConfig;

const DEFAULT_CONFIG_PATH: &str = "runtime_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Stock Oracle — starting up");

    let config_path =
        std::env::var("ORACLE_CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());

    let mut config = RuntimeConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });
    config.apply_env();

    if config.provider.api_key.is_empty() {
        warn!("ALPHA_VANTAGE_API_KEY is not set — every market data request will fail");
    }

    info!(
        bind_addr = %config.bind_addr,
        requests_per_minute = config.provider.requests_per_minute,
        history_days = config.provider.history_days,
        history_capacity = config.history_capacity,
        "Configuration resolved"
    );

    // ── 2. Build shared state ────────────────────────────────────────────
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config.clone()).context("failed to build app state")?);

    // ── 3. Start the API server ──────────────────────────────────────────
    let app = api::router(state.clone());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    // ── 4. Serve until Ctrl+C ────────────────────────────────────────────
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for shutdown signal");
            }
            warn!("Shutdown signal received — stopping gracefully");
        })
        .await
        .context("API server failed")?;

    if let Err(e) = config.save(&config_path) {
        warn!(error = %e, "Failed to save runtime config on shutdown");
    }

    info!(
        predictions = state
            .predictions_served
            .load(std::sync::atomic::Ordering::Relaxed),
        "Stock Oracle shut down complete."
    );
    Ok(())
}
