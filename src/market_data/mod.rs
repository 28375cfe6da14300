// =============================================================================
// Market Data — quote + daily close retrieval
// =============================================================================
//
// Everything that talks to the outside world to obtain prices lives here.
// The prediction engine never calls into this module; the API layer fetches
// a `MarketSnapshot` first and then hands the history to the engine.

pub mod alpha_vantage;
pub mod rate_limit;

use serde::Serialize;
use thiserror::Error;

use crate::types::{PricePoint, Quote};

pub use alpha_vantage::AlphaVantageClient;
pub use rate_limit::RateLimiter;

/// Current quote plus the daily closes used for prediction and charting.
#[derive(Debug, Clone, Serialize)]
pub struct MarketSnapshot {
    pub quote: Quote,
    /// Oldest first.
    pub history: Vec<PricePoint>,
}

/// The provider could not deliver data for a ticker (unknown symbol,
/// network failure, throttling, malformed payload).
#[derive(Debug, Error)]
#[error("Stock ticker \"{ticker}\" not found or data unavailable")]
pub struct DataUnavailable {
    pub ticker: String,
    pub reason: String,
}

impl DataUnavailable {
    pub fn new(ticker: impl Into<String>, reason: anyhow::Error) -> Self {
        Self {
            ticker: ticker.into(),
            reason: format!("{reason:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn unavailable_message_names_ticker() {
        let err = DataUnavailable::new("ZZZZ", anyhow!("invalid quote data"));
        assert_eq!(
            err.to_string(),
            "Stock ticker \"ZZZZ\" not found or data unavailable"
        );
        assert_eq!(err.reason, "invalid quote data");
    }
}
