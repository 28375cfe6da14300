// =============================================================================
// Runtime Configuration — service settings with atomic save
// =============================================================================
//
// Every tunable of the service lives here. The file is plain JSON; all fields
// carry `#[serde(default)]` so that adding new fields never breaks loading an
// older config file.
//
// The provider API key is read from the environment and is never written back
// to disk.
// =============================================================================

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::market_data::alpha_vantage::DEFAULT_BASE_URL;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_requests_per_minute() -> u32 {
    5
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_history_days() -> usize {
    30
}

fn default_history_capacity() -> usize {
    500
}

fn default_refresh_batch_size() -> usize {
    2
}

fn default_refresh_pause_ms() -> u64 {
    2_000
}

// =============================================================================
// ProviderConfig
// =============================================================================

/// Market data provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Query endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Taken from `ALPHA_VANTAGE_API_KEY`; never serialised.
    #[serde(skip)]
    pub api_key: String,

    /// Request budget per minute; `0` disables the limiter.
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Newest daily closes fetched per ticker.
    #[serde(default = "default_history_days")]
    pub history_days: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            requests_per_minute: default_requests_per_minute(),
            request_timeout_secs: default_request_timeout_secs(),
            history_days: default_history_days(),
        }
    }
}

impl ProviderConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Address the REST API listens on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default)]
    pub provider: ProviderConfig,

    /// Maximum predictions kept in the in-memory history.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Tickers re-quoted concurrently during a history refresh.
    #[serde(default = "default_refresh_batch_size")]
    pub refresh_batch_size: usize,

    /// Pause between refresh batches, in milliseconds.
    #[serde(default = "default_refresh_pause_ms")]
    pub refresh_pause_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            provider: ProviderConfig::default(),
            history_capacity: default_history_capacity(),
            refresh_batch_size: default_refresh_batch_size(),
            refresh_pause_ms: default_refresh_pause_ms(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            bind_addr = %config.bind_addr,
            requests_per_minute = config.provider.requests_per_minute,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }

    /// Apply environment overrides (`ORACLE_BIND_ADDR`, `ALPHA_VANTAGE_API_KEY`).
    pub fn apply_env(&mut self) {
        if let Ok(addr) = std::env::var("ORACLE_BIND_ADDR") {
            if !addr.trim().is_empty() {
                self.bind_addr = addr.trim().to_string();
            }
        }
        if let Ok(key) = std::env::var("ALPHA_VANTAGE_API_KEY") {
            self.provider.api_key = key.trim().to_string();
        }
    }

    pub fn refresh_pause(&self) -> Duration {
        Duration::from_millis(self.refresh_pause_ms)
    }
}
