// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   multiplier = 2 / (period + 1)
//   EMA_t      = close_t * multiplier + EMA_{t-1} * (1 - multiplier)
//
// The first EMA value is seeded with the first close of the window, not with
// an SMA. The window handed in is usually wider than `period` (EMA-12 runs
// over the trailing 20 closes, EMA-26 over the trailing 30) so that short
// series still produce a value.
// =============================================================================

use super::sma::trailing;

/// EMA over the whole of `window`, seeded with `window[0]`.
///
/// Returns `None` when the window is empty, the period is zero, or the
/// result is non-finite.
pub fn calculate_ema(window: &[f64], period: usize) -> Option<f64> {
    let (&seed, rest) = window.split_first()?;
    if period == 0 {
        return None;
    }
    let multiplier = 2.0 / (period + 1) as f64;

    // ema + m * (close - ema) == close * m + ema * (1 - m); this form keeps a
    // flat series exactly flat.
    let ema = rest
        .iter()
        .fold(seed, |ema, &close| ema + multiplier * (close - ema));

    ema.is_finite().then_some(ema)
}

/// EMA with look-back `period` computed over the trailing `window_len`
/// closes (or all closes when fewer are available).
pub fn trailing_ema(closes: &[f64], period: usize, window_len: usize) -> Option<f64> {
    calculate_ema(trailing(closes, window_len), period)
}
