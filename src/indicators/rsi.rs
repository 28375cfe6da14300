// =============================================================================
// Relative Strength Index (RSI) — fixed-divisor variant
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an asset is overbought or oversold.
//
// Step 1 — Take the trailing `period + 1` closes and compute their `period`
//          consecutive deltas.
// Step 2 — Split deltas into gains (positive deltas) and losses (absolute
//          value of negative deltas).
// Step 3 — avg_gain = sum(gains) / period
//          avg_loss = sum(losses) / period
//          The divisor is always `period`, however many gain or loss days
//          there were. No Wilder smoothing.
// Step 4 — RSI = 100 when avg_loss == 0, otherwise
//          RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//
// Thresholds:  RSI > 70 => OVERBOUGHT,  RSI < 30 => OVERSOLD.
// =============================================================================

use super::sma::trailing;

pub const OVERBOUGHT: f64 = 70.0;
pub const OVERSOLD: f64 = 30.0;

/// Compute the current RSI from the trailing `period + 1` closes.
///
/// Shorter series use whatever deltas exist, still divided by `period`.
///
/// # Edge cases
/// - `period == 0` => `None`
/// - No down moves (including a flat or single-point series) => `100.0`
/// - Non-finite results => `None`
pub fn calculate_rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 {
        return None;
    }

    let window = trailing(closes, period + 1);
    let (sum_gain, sum_loss) = window.windows(2).map(|w| w[1] - w[0]).fold(
        (0.0_f64, 0.0_f64),
        |(g, l), d| {
            if d > 0.0 {
                (g + d, l)
            } else {
                (g, l - d)
            }
        },
    );

    let period_f = period as f64;
    let avg_gain = sum_gain / period_f;
    let avg_loss = sum_loss / period_f;

    let rsi = if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    };

    rsi.is_finite().then_some(rsi)
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsi_period_zero() {
        assert!(calculate_rsi(&[1.0, 2.0, 3.0], 0).is_none());
    }

    #[test]
    fn rsi_all_gains_is_100() {
        let closes: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        assert_eq!(calculate_rsi(&closes, 14), Some(100.0));
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let closes: Vec<f64> = (1..=30).rev().map(|x| x as f64).collect();
        let v = calculate_rsi(&closes, 14).unwrap();
        assert!(v.abs() < 1e-10, "expected 0.0, got {v}");
    }

    #[test]
    fn rsi_flat_market_is_100() {
        // No losses at all => avg_loss == 0 => 100.
        let closes = vec![100.0; 30];
        assert_eq!(calculate_rsi(&closes, 14), Some(100.0));
    }

    #[test]
    fn rsi_only_looks_at_trailing_window() {
        // A crash long before the trailing 15 closes is ignored.
        let mut closes = vec![100.0, 10.0];
        closes.extend((1..=15).map(|x| 10.0 + x as f64));
        assert_eq!(calculate_rsi(&closes, 14), Some(100.0));
    }

    #[test]
    fn rsi_fixed_divisor() {
        // Trailing 15 closes: 13 flat deltas, then +2, then -1.
        // avg_gain = 2/14, avg_loss = 1/14 => RS = 2 => RSI = 66.67
        let mut closes = vec![10.0; 13];
        closes.extend([10.0, 12.0, 11.0]);
        let v = calculate_rsi(&closes, 14).unwrap();
        assert!((v - (100.0 - 100.0 / 3.0)).abs() < 1e-10, "got {v}");
    }

    #[test]
    fn rsi_range_check() {
        let closes = vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 44.18, 44.22, 44.57, 43.42, 42.66, 43.13,
        ];
        let v = calculate_rsi(&closes, 14).unwrap();
        assert!((0.0..=100.0).contains(&v), "RSI {v} out of range");
    }

    #[test]
    fn rsi_short_series() {
        assert_eq!(calculate_rsi(&[5.0], 14), Some(100.0));
        let v = calculate_rsi(&[5.0, 4.0], 14).unwrap();
        assert!(v.abs() < 1e-10);
    }
}
