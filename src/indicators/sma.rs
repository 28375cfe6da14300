// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
// Arithmetic mean of the trailing `period` closes. When the series is shorter
// than `period` the mean is taken over whatever history exists.
//
// Means are accumulated as offsets from the window's first close, so a window
// of identical closes returns that close exactly. The trend and cross factors
// compare SMAs of different lengths; a flat series must not tip them.

/// Mean of the trailing `period` closes (or all closes if fewer).
///
/// Returns `None` for an empty series or `period == 0`.
pub fn calculate_sma(closes: &[f64], period: usize) -> Option<f64> {
    mean(trailing(closes, period))
}

/// `first + Σ(x - first) / n`. `None` for an empty window.
pub(crate) fn mean(window: &[f64]) -> Option<f64> {
    let (&anchor, _) = window.split_first()?;
    let offset = window.iter().map(|x| x - anchor).sum::<f64>() / window.len() as f64;
    Some(anchor + offset)
}

/// The last `len` elements of `closes`, or the whole slice if it is shorter.
pub(crate) fn trailing(closes: &[f64], len: usize) -> &[f64] {
    &closes[closes.len().saturating_sub(len)..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_of_trailing_window() {
        let closes: Vec<f64> = (1..=10).map(|x| x as f64).collect();
        // last five: 6..=10
        assert!((calculate_sma(&closes, 5).unwrap() - 8.0).abs() < 1e-12);
        assert!((calculate_sma(&closes, 10).unwrap() - 5.5).abs() < 1e-12);
    }

    #[test]
    fn sma_short_series_uses_available_history() {
        let closes = vec![2.0, 4.0, 6.0];
        assert!((calculate_sma(&closes, 20).unwrap() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn sma_empty_or_zero_period() {
        assert!(calculate_sma(&[], 5).is_none());
        assert!(calculate_sma(&[1.0, 2.0], 0).is_none());
    }

    #[test]
    fn sma_flat_series_is_exact_at_any_level() {
        for cents in (100..100_000).step_by(7) {
            let v = cents as f64 / 100.0;
            let closes = vec![v; 25];
            assert_eq!(calculate_sma(&closes, 5), Some(v), "level {v}");
            assert_eq!(calculate_sma(&closes, 20), Some(v), "level {v}");
        }
    }

    #[test]
    fn mean_of_empty_window() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[3.0, 5.0]), Some(4.0));
    }

    #[test]
    fn trailing_clamps_to_length() {
        let closes = [1.0, 2.0, 3.0];
        assert_eq!(trailing(&closes, 2), &[2.0, 3.0]);
        assert_eq!(trailing(&closes, 10), &[1.0, 2.0, 3.0]);
    }
}
