// =============================================================================
// Shared types used across the Stock Oracle service
// =============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Directional call for the next period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Up => write!(f, "UP"),
            Self::Down => write!(f, "DOWN"),
        }
    }
}

/// One daily close. A price series is a `&[PricePoint]`, oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }
}

/// Output of the prediction engine.
///
/// `confidence` is an integer percentage, always within
/// [`MIN_CONFIDENCE`]..=[`MAX_CONFIDENCE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub direction: Direction,
    pub confidence: u8,
}

pub const MIN_CONFIDENCE: u8 = 55;
pub const MAX_CONFIDENCE: u8 = 88;

/// Latest quote as reported by the market data provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
}
