// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators used by the
// prediction engine. Every public function returns `Option<T>` so callers
// are forced to handle empty-input and numerical-edge-case scenarios.
//
// `compute_indicators` bundles them into one `IndicatorSnapshot` per call.
// Snapshots are never cached.

pub mod bollinger;
pub mod ema;
pub mod momentum;
pub mod rsi;
pub mod sma;

use serde::Serialize;

use self::bollinger::calculate_bollinger;
use self::ema::trailing_ema;
use self::momentum::{calculate_momentum, recent_volatility};
use self::rsi::calculate_rsi;
use self::sma::calculate_sma;

pub const RSI_PERIOD: usize = 14;
pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_STD: f64 = 2.0;

/// EMA-12 runs over the trailing 20 closes, EMA-26 over the trailing 30.
const EMA_FAST: (usize, usize) = (12, 20);
const EMA_SLOW: (usize, usize) = (26, 30);

/// All indicator readings for the latest close of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    pub current_price: f64,
    pub sma5: f64,
    pub sma10: f64,
    pub sma20: f64,
    /// Equals `sma20` when fewer than 50 closes exist.
    pub sma50: f64,
    pub ema12: f64,
    pub ema26: f64,
    pub macd: f64,
    pub rsi: f64,
    pub sma20_bb: f64,
    pub upper_band: f64,
    pub lower_band: f64,
    pub momentum5: f64,
    pub momentum7: f64,
    pub recent_volatility: f64,
}

/// Compute every indicator for `closes` (oldest first).
///
/// Windows wider than the series fall back to the available history. Returns
/// `None` only for an empty series or when a reading turns out non-finite.
pub fn compute_indicators(closes: &[f64]) -> Option<IndicatorSnapshot> {
    let current_price = *closes.last()?;

    let sma5 = calculate_sma(closes, 5)?;
    let sma10 = calculate_sma(closes, 10)?;
    let sma20 = calculate_sma(closes, 20)?;
    let sma50 = if closes.len() >= 50 {
        calculate_sma(closes, 50)?
    } else {
        sma20
    };

    let ema12 = trailing_ema(closes, EMA_FAST.0, EMA_FAST.1)?;
    let ema26 = trailing_ema(closes, EMA_SLOW.0, EMA_SLOW.1)?;

    let rsi = calculate_rsi(closes, RSI_PERIOD)?;
    let bands = calculate_bollinger(closes, BOLLINGER_PERIOD, BOLLINGER_STD)?;

    let snapshot = IndicatorSnapshot {
        current_price,
        sma5,
        sma10,
        sma20,
        sma50,
        ema12,
        ema26,
        macd: ema12 - ema26,
        rsi,
        sma20_bb: bands.middle,
        upper_band: bands.upper,
        lower_band: bands.lower,
        momentum5: calculate_momentum(closes, 5)?,
        momentum7: calculate_momentum(closes, 7)?,
        recent_volatility: recent_volatility(closes),
    };

    snapshot.is_finite().then_some(snapshot)
}

impl IndicatorSnapshot {
    fn is_finite(&self) -> bool {
        [
            self.current_price,
            self.sma5,
            self.sma10,
            self.sma20,
            self.sma50,
            self.ema12,
            self.ema26,
            self.macd,
            self.rsi,
            self.sma20_bb,
            self.upper_band,
            self.lower_band,
            self.momentum5,
            self.momentum7,
            self.recent_volatility,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ascending(n: usize) -> Vec<f64> {
        (1..=n).map(|i| i as f64).collect()
    }

    #[test]
    fn empty_series_has_no_snapshot() {
        assert!(compute_indicators(&[]).is_none());
    }

    #[test]
    fn single_close_degrades_gracefully() {
        let s = compute_indicators(&[42.0]).unwrap();
        assert_eq!(s.sma5, 42.0);
        assert_eq!(s.sma50, 42.0);
        assert_eq!(s.macd, 0.0);
        assert_eq!(s.rsi, 100.0);
        assert_eq!(s.momentum5, 0.0);
        assert_eq!(s.recent_volatility, 0.0);
    }

    #[test]
    fn ascending_snapshot() {
        let s = compute_indicators(&ascending(25)).unwrap();
        assert_eq!(s.current_price, 25.0);
        assert_eq!(s.sma5, 23.0);
        assert_eq!(s.sma10, 20.5);
        assert_eq!(s.sma20, 15.5);
        assert_eq!(s.sma50, s.sma20);
        assert!(s.macd > 0.0);
        assert_eq!(s.rsi, 100.0);
        assert_eq!(s.sma20_bb, s.sma20);
        assert_eq!(s.momentum5, 5.0);
        assert_eq!(s.momentum7, 7.0);
        assert!((s.recent_volatility - 1.0 / 24.0).abs() < 1e-12);
    }

    #[test]
    fn sma50_used_once_history_allows() {
        let s = compute_indicators(&ascending(60)).unwrap();
        // mean of 11..=60
        assert_eq!(s.sma50, 35.5);
        assert_eq!(s.sma20, 50.5);
    }

    #[test]
    fn flat_series_snapshot() {
        let s = compute_indicators(&[100.0; 25]).unwrap();
        assert_eq!(s.rsi, 100.0);
        assert_eq!(s.macd, 0.0);
        assert_eq!(s.momentum5, 0.0);
        assert_eq!(s.momentum7, 0.0);
        assert_eq!(s.lower_band, s.sma20_bb);
        assert_eq!(s.upper_band, s.sma20_bb);
    }

    #[test]
    fn bands_bracket_mean() {
        let closes: Vec<f64> = (0..30).map(|i| 50.0 + ((i * 7) % 11) as f64).collect();
        let s = compute_indicators(&closes).unwrap();
        assert!(s.lower_band <= s.sma20_bb && s.sma20_bb <= s.upper_band);
        assert!((0.0..=100.0).contains(&s.rsi));
    }
}
