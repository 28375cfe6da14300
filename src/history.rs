// =============================================================================
// Prediction History — bounded in-memory log of past predictions
// =============================================================================
//
// Every prediction served by the API is recorded together with the price at
// the time of the call, so later quotes can show how the call played out.
// Durable storage is somebody else's job; this log lives only as long as the
// process and evicts the oldest record once `capacity` is reached.
//
// Price refreshes re-quote each distinct ticker once, in small batches, and
// hold each batch back until the provider budget has room for it. A refresh
// can outlive the request that started it, so its progress is kept here for
// polling.
// =============================================================================

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::market_data::{DataUnavailable, RateLimiter};
use crate::types::{Direction, Prediction, Quote};

/// One served prediction and how the price has moved since.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionRecord {
    pub id: Uuid,
    pub ticker: String,
    pub direction: Direction,
    pub confidence: u8,

    /// Price when the prediction was made.
    pub search_price: f64,
    /// Absolute day change reported alongside `search_price`.
    pub search_change: f64,

    /// Latest known price.
    pub current_price: f64,
    /// `(current_price - search_price) / search_price * 100`.
    pub current_profit_loss_pct: f64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PredictionRecord {
    pub fn new(ticker: impl Into<String>, prediction: Prediction, quote: &Quote) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            ticker: ticker.into(),
            direction: prediction.direction,
            confidence: prediction.confidence,
            search_price: quote.price,
            search_change: quote.change,
            current_price: quote.price,
            current_profit_loss_pct: 0.0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a fresh quote. Non-positive or non-finite prices are ignored.
    pub fn apply_price(&mut self, price: f64) -> bool {
        if !(price.is_finite() && price > 0.0) || self.search_price <= 0.0 {
            return false;
        }
        self.current_price = price;
        self.current_profit_loss_pct = (price - self.search_price) / self.search_price * 100.0;
        self.updated_at = Utc::now();
        true
    }

    /// Whether the move since the call agrees with the predicted direction.
    /// `None` while the price has not moved.
    pub fn is_correct(&self) -> Option<bool> {
        if self.current_price == self.search_price {
            return None;
        }
        let went_up = self.current_price > self.search_price;
        Some(went_up == (self.direction == Direction::Up))
    }
}

/// Progress of the current or most recent history-wide price refresh.
/// `updated` and `failed` count records; `tickers` counts distinct quotes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshProgress {
    pub running: bool,
    pub records: usize,
    pub tickers: usize,
    pub updated: usize,
    pub failed: usize,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Thread-safe, capacity-bounded prediction log (newest last).
pub struct PredictionHistory {
    capacity: usize,
    records: RwLock<VecDeque<PredictionRecord>>,
    refresh: RwLock<RefreshProgress>,
}

impl PredictionHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            records: RwLock::new(VecDeque::new()),
            refresh: RwLock::new(RefreshProgress::default()),
        }
    }

    /// Append a record, evicting the oldest ones beyond capacity.
    pub fn record(&self, record: PredictionRecord) {
        let mut records = self.records.write();
        records.push_back(record);
        while records.len() > self.capacity {
            if let Some(evicted) = records.pop_front() {
                debug!(id = %evicted.id, ticker = %evicted.ticker, "history record evicted");
            }
        }
    }

    /// All records, newest first.
    pub fn list(&self) -> Vec<PredictionRecord> {
        self.records.read().iter().rev().cloned().collect()
    }

    pub fn get(&self, id: Uuid) -> Option<PredictionRecord> {
        self.records.read().iter().find(|r| r.id == id).cloned()
    }

    pub fn remove(&self, id: Uuid) -> bool {
        let mut records = self.records.write();
        match records.iter().position(|r| r.id == id) {
            Some(index) => {
                records.remove(index);
                true
            }
            None => false,
        }
    }

    /// Drop every record and return how many there were.
    pub fn clear(&self) -> usize {
        let mut records = self.records.write();
        let n = records.len();
        records.clear();
        n
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply `price` to record `id`. Returns `false` when the record is gone
    /// or the price was rejected.
    pub fn apply_price(&self, id: Uuid, price: f64) -> bool {
        self.records
            .write()
            .iter_mut()
            .find(|r| r.id == id)
            .is_some_and(|r| r.apply_price(price))
    }

    /// Mark a refresh as started. Returns `false` if one is already running.
    pub fn begin_refresh(&self) -> bool {
        let mut progress = self.refresh.write();
        if progress.running {
            return false;
        }
        *progress = RefreshProgress {
            running: true,
            started_at: Some(Utc::now()),
            ..RefreshProgress::default()
        };
        true
    }

    pub fn refresh_progress(&self) -> RefreshProgress {
        self.refresh.read().clone()
    }

    /// Re-quote every distinct ticker in the log, `batch_size` at a time.
    /// Before each batch the refresh sleeps `pause` (after the first) and
    /// then until `limiter` has room for the whole batch. Every record of a
    /// ticker takes that ticker's quote.
    pub async fn refresh_prices<F, Fut>(
        &self,
        batch_size: usize,
        pause: Duration,
        limiter: &RateLimiter,
        fetch_quote: F,
    ) -> RefreshProgress
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<Quote, DataUnavailable>>,
    {
        let targets = self.targets_by_ticker();
        {
            let mut progress = self.refresh.write();
            if !progress.running {
                progress.started_at = Some(Utc::now());
            }
            progress.running = true;
            progress.finished_at = None;
            progress.records = targets.iter().map(|(_, ids)| ids.len()).sum();
            progress.tickers = targets.len();
            progress.updated = 0;
            progress.failed = 0;
        }

        for (i, batch) in targets.chunks(batch_size.max(1)).enumerate() {
            if i > 0 && !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
            let slots = u32::try_from(batch.len()).unwrap_or(u32::MAX);
            while let Some(wait) = limiter.wait_for(slots) {
                debug!(wait_secs = wait.as_secs(), "refresh waiting for rate-limit window");
                tokio::time::sleep(wait).await;
            }

            let quotes = join_all(batch.iter().map(|(ticker, _)| fetch_quote(ticker.clone()))).await;

            let (mut updated, mut failed) = (0, 0);
            for ((ticker, ids), quote) in batch.iter().zip(quotes) {
                match quote {
                    Ok(q) => {
                        for id in ids {
                            if self.apply_price(*id, q.price) {
                                updated += 1;
                            } else {
                                failed += 1;
                            }
                        }
                        if !(q.price.is_finite() && q.price > 0.0) {
                            warn!(ticker = %ticker, price = q.price, "no valid price to apply");
                        }
                    }
                    Err(e) => {
                        warn!(ticker = %ticker, reason = %e.reason, "price refresh failed");
                        failed += ids.len();
                    }
                }
            }

            let mut progress = self.refresh.write();
            progress.updated += updated;
            progress.failed += failed;
        }

        let mut progress = self.refresh.write();
        progress.running = false;
        progress.finished_at = Some(Utc::now());
        info!(
            tickers = progress.tickers,
            updated = progress.updated,
            failed = progress.failed,
            "history prices refreshed"
        );
        progress.clone()
    }

    /// Record ids grouped by ticker, in order of each ticker's first record.
    fn targets_by_ticker(&self) -> Vec<(String, Vec<Uuid>)> {
        let records = self.records.read();
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut targets: Vec<(String, Vec<Uuid>)> = Vec::new();
        for r in records.iter() {
            match index.get(r.ticker.as_str()) {
                Some(&i) => targets[i].1.push(r.id),
                None => {
                    index.insert(r.ticker.as_str(), targets.len());
                    targets.push((r.ticker.clone(), vec![r.id]));
                }
            }
        }
        targets
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use std::sync::Arc;

    fn quote(price: f64) -> Quote {
        Quote {
            price,
            change: 1.0,
            change_percent: 0.5,
        }
    }

    fn record(ticker: &str, direction: Direction, price: f64) -> PredictionRecord {
        PredictionRecord::new(
            ticker,
            Prediction {
                direction,
                confidence: 70,
            },
            &quote(price),
        )
    }

    #[test]
    fn new_record_starts_flat() {
        let r = record("AAPL", Direction::Up, 100.0);
        assert_eq!(r.current_price, 100.0);
        assert_eq!(r.current_profit_loss_pct, 0.0);
        assert_eq!(r.search_change, 1.0);
        assert_eq!(r.is_correct(), None);
    }

    #[test]
    fn apply_price_updates_pnl() {
        let mut r = record("AAPL", Direction::Up, 100.0);
        assert!(r.apply_price(110.0));
        assert!((r.current_profit_loss_pct - 10.0).abs() < 1e-9);
        assert_eq!(r.is_correct(), Some(true));

        assert!(r.apply_price(95.0));
        assert!((r.current_profit_loss_pct + 5.0).abs() < 1e-9);
        assert_eq!(r.is_correct(), Some(false));
    }

    #[test]
    fn apply_price_rejects_bad_prices() {
        let mut r = record("AAPL", Direction::Down, 100.0);
        assert!(!r.apply_price(0.0));
        assert!(!r.apply_price(-3.0));
        assert!(!r.apply_price(f64::NAN));
        assert_eq!(r.current_price, 100.0);
    }

    #[test]
    fn capacity_evicts_oldest() {
        let h = PredictionHistory::new(2);
        h.record(record("A", Direction::Up, 1.0));
        h.record(record("B", Direction::Up, 1.0));
        h.record(record("C", Direction::Up, 1.0));
        let tickers: Vec<_> = h.list().into_iter().map(|r| r.ticker).collect();
        assert_eq!(tickers, vec!["C", "B"]);
    }

    #[test]
    fn get_remove_clear() {
        let h = PredictionHistory::new(10);
        let r = record("MSFT", Direction::Down, 300.0);
        let id = r.id;
        h.record(r);
        h.record(record("TSLA", Direction::Up, 200.0));

        assert_eq!(h.get(id).unwrap().ticker, "MSFT");
        assert!(h.remove(id));
        assert!(!h.remove(id));
        assert!(h.get(id).is_none());
        assert_eq!(h.clear(), 1);
        assert!(h.is_empty());
    }

    #[tokio::test]
    async fn refresh_updates_and_counts_failures() {
        let h = PredictionHistory::new(10);
        h.record(record("AAPL", Direction::Up, 100.0));
        h.record(record("FAIL", Direction::Up, 50.0));
        h.record(record("ZERO", Direction::Down, 10.0));

        let limiter = RateLimiter::per_minute(0);
        let progress = h
            .refresh_prices(2, Duration::from_millis(5), &limiter, |ticker| async move {
                match ticker.as_str() {
                    "AAPL" => Ok(quote(120.0)),
                    "ZERO" => Ok(quote(0.0)),
                    _ => Err(DataUnavailable::new(ticker, anyhow!("boom"))),
                }
            })
            .await;

        assert!(!progress.running);
        assert_eq!((progress.updated, progress.failed), (1, 2));
        assert!(progress.finished_at.is_some());
        assert_eq!(h.refresh_progress(), progress);
        let aapl = h.list().into_iter().find(|r| r.ticker == "AAPL").unwrap();
        assert_eq!(aapl.current_price, 120.0);
        assert!((aapl.current_profit_loss_pct - 20.0).abs() < 1e-9);
        let zero = h.list().into_iter().find(|r| r.ticker == "ZERO").unwrap();
        assert_eq!(zero.current_price, 10.0);
    }

    #[tokio::test]
    async fn refresh_quotes_each_ticker_once_and_waits_for_budget() {
        let h = PredictionHistory::new(10);
        for ticker in ["AAPL", "MSFT", "AAPL", "TSLA", "NVDA", "AMD", "MSFT"] {
            h.record(record(ticker, Direction::Up, 100.0));
        }

        // Two requests per one-second window, fewer than the five tickers.
        let limiter = Arc::new(RateLimiter::new(2, 1));
        let calls = Arc::new(AtomicUsize::new(0));
        let fetch = {
            let limiter = limiter.clone();
            let calls = calls.clone();
            move |ticker: String| {
                let limiter = limiter.clone();
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, AtomicOrdering::SeqCst);
                    if limiter.try_acquire() {
                        Ok(quote(101.0))
                    } else {
                        Err(DataUnavailable::new(ticker, anyhow!("throttled")))
                    }
                }
            }
        };

        let progress = h.refresh_prices(2, Duration::ZERO, &limiter, fetch).await;

        assert_eq!(calls.load(AtomicOrdering::SeqCst), 5);
        assert_eq!(progress.tickers, 5);
        assert_eq!(progress.records, 7);
        assert_eq!((progress.updated, progress.failed), (7, 0));
        assert!(h.list().iter().all(|r| r.current_price == 101.0));
    }

    #[test]
    fn only_one_refresh_at_a_time() {
        let h = PredictionHistory::new(10);
        assert!(h.begin_refresh());
        assert!(!h.begin_refresh());
        let progress = h.refresh_progress();
        assert!(progress.running);
        assert!(progress.started_at.is_some());
    }

    #[tokio::test]
    async fn refresh_empty_history() {
        let h = PredictionHistory::new(10);
        let limiter = RateLimiter::per_minute(5);
        let progress = h
            .refresh_prices(2, Duration::ZERO, &limiter, |_t: String| async {
                Ok::<_, DataUnavailable>(quote(1.0))
            })
            .await;
        assert_eq!((progress.records, progress.updated, progress.failed), (0, 0, 0));
        assert!(!progress.running);
    }
}
