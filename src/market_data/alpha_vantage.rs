// =============================================================================
// Alpha Vantage REST client — quotes and daily closes
// =============================================================================
//
// SECURITY: The API key is only ever placed in the request URL; it is never
// logged (the request spans skip `self`) and never written to the config file.
//
// Alpha Vantage answers most failures with HTTP 200 and an in-band message
// ("Note", "Information", "Error Message") or an empty "Global Quote" object.
// All of these are reported as unavailability.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::rate_limit::RateLimiter;
use super::{DataUnavailable, MarketSnapshot};
use crate::types::{PricePoint, Quote};

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";

/// Keys Alpha Vantage uses for in-band errors and throttling notices.
const IN_BAND_ERRORS: &[&str] = &["Error Message", "Note", "Information"];

/// Alpha Vantage client with a shared request budget.
#[derive(Clone)]
pub struct AlphaVantageClient {
    api_key: String,
    base_url: String,
    history_days: usize,
    limiter: Arc<RateLimiter>,
    client: reqwest::Client,
}

impl AlphaVantageClient {
    /// Build a client.
    ///
    /// # Arguments
    /// * `api_key`      — Alpha Vantage key (never logged).
    /// * `base_url`     — query endpoint, normally [`DEFAULT_BASE_URL`].
    /// * `history_days` — how many of the newest daily closes to keep.
    /// * `timeout`      — per-request timeout.
    /// * `limiter`      — request budget shared by every clone.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        history_days: usize,
        timeout: Duration,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        let base_url = base_url.into();
        debug!(base_url = %base_url, history_days, "AlphaVantageClient initialised");

        Ok(Self {
            api_key: api_key.into(),
            base_url,
            history_days,
            limiter,
            client,
        })
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    // -------------------------------------------------------------------------
    // Public API
    // -------------------------------------------------------------------------

    /// GLOBAL_QUOTE for `ticker`.
    #[instrument(skip(self), name = "alpha_vantage::quote")]
    pub async fn quote(&self, ticker: &str) -> Result<Quote, DataUnavailable> {
        let body = self
            .fetch("GLOBAL_QUOTE", ticker)
            .await
            .map_err(|e| DataUnavailable::new(ticker, e))?;
        parse_global_quote(&body).map_err(|e| DataUnavailable::new(ticker, e))
    }

    /// TIME_SERIES_DAILY for `ticker`, newest `history_days` closes, oldest
    /// first.
    #[instrument(skip(self), name = "alpha_vantage::daily_closes")]
    pub async fn daily_closes(&self, ticker: &str) -> Result<Vec<PricePoint>, DataUnavailable> {
        let body = self
            .fetch("TIME_SERIES_DAILY", ticker)
            .await
            .map_err(|e| DataUnavailable::new(ticker, e))?;
        parse_daily_series(&body, self.history_days).map_err(|e| DataUnavailable::new(ticker, e))
    }

    /// Quote plus history, as the predictor needs them.
    pub async fn snapshot(&self, ticker: &str) -> Result<MarketSnapshot, DataUnavailable> {
        let quote = self.quote(ticker).await?;
        let history = self.daily_closes(ticker).await?;
        debug!(ticker, closes = history.len(), price = quote.price, "market snapshot fetched");
        Ok(MarketSnapshot { quote, history })
    }

    // -------------------------------------------------------------------------
    // Transport
    // -------------------------------------------------------------------------

    async fn fetch(&self, function: &str, ticker: &str) -> Result<Value> {
        if !self.limiter.try_acquire() {
            bail!("provider rate limit reached, try again shortly");
        }

        let url = format!(
            "{}?function={}&symbol={}&apikey={}",
            self.base_url, function, ticker, self.api_key
        );

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("{function} request failed"))?;

        let status = resp.status();
        if !status.is_success() {
            warn!(function, status = %status, "Alpha Vantage returned an error status");
            bail!("HTTP {status}");
        }

        resp.json()
            .await
            .with_context(|| format!("failed to parse {function} response"))
    }
}

impl std::fmt::Debug for AlphaVantageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlphaVantageClient")
            .field("base_url", &self.base_url)
            .field("history_days", &self.history_days)
            .field("limiter", &self.limiter)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Response parsing
// =============================================================================

fn check_in_band_error(body: &Value) -> Result<()> {
    for key in IN_BAND_ERRORS {
        if let Some(msg) = body.get(*key).and_then(Value::as_str) {
            bail!("{key}: {msg}");
        }
    }
    Ok(())
}

fn parse_number(raw: Option<&Value>, field: &str) -> Result<f64> {
    let s = raw
        .and_then(Value::as_str)
        .with_context(|| format!("missing field '{field}'"))?;
    s.trim()
        .trim_end_matches('%')
        .parse::<f64>()
        .with_context(|| format!("field '{field}' is not a number: {s:?}"))
}

/// Parse a GLOBAL_QUOTE body.
pub fn parse_global_quote(body: &Value) -> Result<Quote> {
    check_in_band_error(body)?;

    let quote = body
        .get("Global Quote")
        .and_then(Value::as_object)
        .filter(|q| q.get("05. price").and_then(Value::as_str).is_some_and(|p| !p.is_empty()))
        .context("invalid quote data")?;

    Ok(Quote {
        price: parse_number(quote.get("05. price"), "05. price")?,
        change: parse_number(quote.get("09. change"), "09. change")?,
        change_percent: parse_number(quote.get("10. change percent"), "10. change percent")?,
    })
}

/// Parse a TIME_SERIES_DAILY body into the newest `max_points` closes,
/// oldest first. Entries with an unparsable date or close are skipped.
pub fn parse_daily_series(body: &Value, max_points: usize) -> Result<Vec<PricePoint>> {
    check_in_band_error(body)?;

    let series = body
        .get("Time Series (Daily)")
        .and_then(Value::as_object)
        .context("no time series data")?;

    let mut points: Vec<PricePoint> = series
        .iter()
        .filter_map(|(date, bar)| {
            let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .ok()
                .zip(parse_number(bar.get("4. close"), "4. close").ok());
            if parsed.is_none() {
                warn!(date = %date, "skipping unparsable daily bar");
            }
            parsed.map(|(date, price)| PricePoint { date, price })
        })
        .collect();

    points.sort_by_key(|p| p.date);
    let skip = points.len().saturating_sub(max_points);
    points.drain(..skip);
    Ok(points)
}
