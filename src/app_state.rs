// =============================================================================
// Central Application State — Stock Oracle
// =============================================================================
//
// Shared by every request handler through `Arc<AppState>`.
//
// Thread safety:
//   - Atomic counters for lock-free request accounting.
//   - parking_lot::RwLock inside `PredictionHistory`.
//   - The market data client is cheap to clone and shares its rate limiter.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;

use crate::history::PredictionHistory;
use crate::market_data::{AlphaVantageClient, RateLimiter};
use crate::runtime_config::RuntimeConfig;

pub struct AppState {
    pub config: RuntimeConfig,
    pub market: AlphaVantageClient,
    pub history: PredictionHistory,

    /// Predictions served since start-up (fallbacks included).
    pub predictions_served: AtomicU64,
    /// Predictions that took the low-data coin-flip path.
    pub fallback_predictions: AtomicU64,

    /// Instant when the service was started. Used for uptime calculations.
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Construct a new `AppState` from the given runtime configuration.
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        let limiter = Arc::new(RateLimiter::per_minute(config.provider.requests_per_minute));
        let market = AlphaVantageClient::new(
            config.provider.api_key.clone(),
            config.provider.base_url.clone(),
            config.provider.history_days,
            config.provider.request_timeout(),
            limiter,
        )?;

        Ok(Self {
            history: PredictionHistory::new(config.history_capacity),
            market,
            config,
            predictions_served: AtomicU64::new(0),
            fallback_predictions: AtomicU64::new(0),
            start_time: std::time::Instant::now(),
        })
    }

    pub fn count_prediction(&self, fallback: bool) {
        self.predictions_served.fetch_add(1, Ordering::Relaxed);
        if fallback {
            self.fallback_predictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
