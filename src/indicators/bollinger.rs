// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Bollinger Bands consist of a middle band (SMA), an upper band (SMA + k*σ),
// and a lower band (SMA - k*σ). σ is the population standard deviation of the
// window (sum of squared deviations divided by N, not N - 1).

use super::sma::{mean, trailing};

/// Result of a Bollinger Band calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerResult {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Calculate Bollinger Bands over the trailing `period` closes.
///
/// Returns `None` when the series is empty or `period == 0`. A series
/// shorter than `period` uses every close it has.
pub fn calculate_bollinger(closes: &[f64], period: usize, num_std: f64) -> Option<BollingerResult> {
    let window = trailing(closes, period);
    let middle = mean(window)?;

    let n = window.len() as f64;
    let variance = window.iter().map(|x| (x - middle).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    Some(BollingerResult {
        upper: middle + num_std * std_dev,
        middle,
        lower: middle - num_std * std_dev,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bollinger_basic() {
        let closes: Vec<f64> = (1..=20).map(|x| x as f64).collect();
        let bb = calculate_bollinger(&closes, 20, 2.0).unwrap();
        assert!((bb.middle - 10.5).abs() < 1e-12);
        // population variance of 1..=20 is (20^2 - 1) / 12
        let sd = (399.0_f64 / 12.0).sqrt();
        assert!((bb.upper - (10.5 + 2.0 * sd)).abs() < 1e-10);
        assert!((bb.lower - (10.5 - 2.0 * sd)).abs() < 1e-10);
    }

    #[test]
    fn bollinger_uses_trailing_window() {
        let mut closes = vec![1000.0; 5];
        closes.extend(vec![50.0; 20]);
        let bb = calculate_bollinger(&closes, 20, 2.0).unwrap();
        assert_eq!(bb.middle, 50.0);
        assert_eq!(bb.upper, 50.0);
        assert_eq!(bb.lower, 50.0);
    }

    #[test]
    fn bollinger_empty() {
        assert!(calculate_bollinger(&[], 20, 2.0).is_none());
        assert!(calculate_bollinger(&[1.0], 0, 2.0).is_none());
    }

    #[test]
    fn bollinger_flat_collapses() {
        for cents in (100..100_000).step_by(3) {
            let v = cents as f64 / 100.0;
            let bb = calculate_bollinger(&vec![v; 20], 20, 2.0).unwrap();
            assert_eq!(bb.middle, v, "level {v}");
            assert_eq!(bb.lower, bb.middle, "level {v}");
            assert_eq!(bb.upper, bb.middle, "level {v}");
        }
    }

    #[test]
    fn bands_are_ordered() {
        let closes = vec![
            10.0, 11.5, 9.8, 12.1, 13.0, 12.2, 11.1, 10.4, 10.9, 11.7, 12.6, 13.3, 12.8, 12.0,
            11.4, 11.9, 12.5, 13.8, 14.2, 13.6,
        ];
        let bb = calculate_bollinger(&closes, 20, 2.0).unwrap();
        assert!(bb.lower < bb.middle && bb.middle < bb.upper);
    }
}
