// =============================================================================
// Predictor — turns a price series into an UP/DOWN call with confidence
// =============================================================================
//
// Pipeline:
//   1. Validate the series (positive finite prices, strictly ascending dates)
//   2. Fewer than 20 closes => coin flip at 55% confidence
//   3. Compute all indicators (SMA, EMA/MACD, RSI, Bollinger, momentum)
//   4. Run the weighted factor table
//   5. Direction = UP only if the bullish score is strictly greater
//   6. Confidence = 50 + |bull - bear| * 50, damped by recent volatility,
//      clamped to [55, 88] and then rounded
//
// The engine holds no state. The only source of non-determinism is the
// caller-supplied RNG used by the low-data fallback.
// =============================================================================

use rand::Rng;
use serde::Serialize;
use thiserror::Error;

use crate::indicators::{compute_indicators, IndicatorSnapshot};
use crate::signals::{score_signals, ScoringResult};
use crate::types::{Direction, Prediction, PricePoint, MAX_CONFIDENCE, MIN_CONFIDENCE};

/// Below this many closes the indicators are not trusted.
pub const MIN_HISTORY: usize = 20;

/// Largest accepted close. Squared deviations of larger prices can overflow
/// the Bollinger variance.
pub const MAX_PRICE: f64 = 1e12;

const HIGH_VOLATILITY: f64 = 0.05;
const HIGH_VOLATILITY_DAMPING: f64 = 0.85;
const EXTREME_VOLATILITY: f64 = 0.10;
const EXTREME_VOLATILITY_DAMPING: f64 = 0.75;

/// Precondition violations on the input series.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    #[error("price at index {index} is not a positive finite number: {price}")]
    InvalidPrice { index: usize, price: f64 },

    #[error("price at index {index} exceeds the supported maximum of 1e12: {price}")]
    PriceTooLarge { index: usize, price: f64 },

    #[error("dates are not strictly ascending at index {index} ({previous} then {current})")]
    UnorderedDates {
        index: usize,
        previous: chrono::NaiveDate,
        current: chrono::NaiveDate,
    },

    #[error("indicator computation produced a non-finite value")]
    NonFiniteIndicator,
}

/// Prediction together with the intermediate readings that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionReport {
    pub prediction: Prediction,
    /// `true` when the low-data coin flip was used.
    pub fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indicators: Option<IndicatorSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scoring: Option<ScoringResult>,
}

/// Predict the next-period direction for `series` (oldest first), keeping
/// the indicator snapshot and factor votes alongside the call.
pub fn resolve<R: Rng + ?Sized>(
    series: &[PricePoint],
    rng: &mut R,
) -> Result<PredictionReport, PredictionError> {
    validate_dates(series)?;
    let closes: Vec<f64> = series.iter().map(|p| p.price).collect();
    resolve_closes(&closes, rng)
}

fn resolve_closes<R: Rng + ?Sized>(
    closes: &[f64],
    rng: &mut R,
) -> Result<PredictionReport, PredictionError> {
    validate_prices(closes)?;

    if closes.len() < MIN_HISTORY {
        return Ok(PredictionReport {
            prediction: fallback_prediction(rng),
            fallback: true,
            indicators: None,
            scoring: None,
        });
    }

    let snapshot = compute_indicators(closes).ok_or(PredictionError::NonFiniteIndicator)?;
    let scoring = score_signals(&snapshot, snapshot.current_price);

    let bullish = scoring.bullish_score();
    let bearish = scoring.bearish_score();

    let direction = if bullish > bearish {
        Direction::Up
    } else {
        Direction::Down
    };
    let confidence = calibrate_confidence((bullish - bearish).abs(), snapshot.recent_volatility);

    Ok(PredictionReport {
        prediction: Prediction {
            direction,
            confidence,
        },
        fallback: false,
        indicators: Some(snapshot),
        scoring: Some(scoring),
    })
}

/// Random direction at the floor confidence.
pub fn fallback_prediction<R: Rng + ?Sized>(rng: &mut R) -> Prediction {
    let direction = if rng.gen_bool(0.5) {
        Direction::Up
    } else {
        Direction::Down
    };
    Prediction {
        direction,
        confidence: MIN_CONFIDENCE,
    }
}

/// Map a signal strength in [0, 1] and the latest one-day move to an integer
/// confidence. Damping thresholds compound. Clamp first, then round.
pub fn calibrate_confidence(signal_strength: f64, recent_volatility: f64) -> u8 {
    let mut confidence = 50.0 + signal_strength * 50.0;

    if recent_volatility > HIGH_VOLATILITY {
        confidence *= HIGH_VOLATILITY_DAMPING;
    }
    if recent_volatility > EXTREME_VOLATILITY {
        confidence *= EXTREME_VOLATILITY_DAMPING;
    }

    confidence
        .clamp(f64::from(MIN_CONFIDENCE), f64::from(MAX_CONFIDENCE))
        .round() as u8
}

// =============================================================================
// Input validation
// =============================================================================

fn validate_prices(closes: &[f64]) -> Result<(), PredictionError> {
    for (index, &price) in closes.iter().enumerate() {
        if !(price.is_finite() && price > 0.0) {
            return Err(PredictionError::InvalidPrice { index, price });
        }
        if price > MAX_PRICE {
            return Err(PredictionError::PriceTooLarge { index, price });
        }
    }
    Ok(())
}

fn validate_dates(series: &[PricePoint]) -> Result<(), PredictionError> {
    for (i, pair) in series.windows(2).enumerate() {
        if pair[1].date <= pair[0].date {
            return Err(PredictionError::UnorderedDates {
                index: i + 1,
                previous: pair[0].date,
                current: pair[1].date,
            });
        }
    }
    Ok(())
}
