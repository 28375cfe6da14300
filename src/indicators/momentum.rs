// =============================================================================
// Momentum & single-day volatility
// =============================================================================
//
// Momentum is the plain price difference over a look-back:
//   momentum_n = close_t - close_{t-n}
//
// Recent volatility is the size of the latest one-day move relative to the
// previous close (not an average):
//   volatility = |close_t - close_{t-1}| / close_{t-1}

/// `close_t - close_{t-lookback}`. When the series is shorter than the
/// look-back, the oldest available close is used.
///
/// Returns `None` for an empty series.
pub fn calculate_momentum(closes: &[f64], lookback: usize) -> Option<f64> {
    let current = *closes.last()?;
    let t = closes.len() - 1;
    let past = closes[t.saturating_sub(lookback)];
    Some(current - past)
}

/// Most recent one-day relative move. `0.0` when fewer than two closes exist
/// or the previous close is zero.
pub fn recent_volatility(closes: &[f64]) -> f64 {
    match closes {
        [.., prev, last] if *prev != 0.0 => ((last - prev) / prev).abs(),
        _ => 0.0,
    }
}
