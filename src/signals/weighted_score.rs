// =============================================================================
// Weighted Signal Scorer — declarative factor table
// =============================================================================
//
// | Factor        | Bullish                          | Bearish                    | W |
// |---------------|----------------------------------|----------------------------|---|
// | short_trend   | price > sma5                     | otherwise                  | 3 |
// | medium_trend  | sma10 > sma20                    | otherwise                  | 2 |
// | long_trend    | sma20 > sma50                    | otherwise                  | 1 |
// | rsi           | <30 → 2, >50 (≤70) → 1           | >70 → 2, ≤50 → 1           | 2 |
// | macd          | macd > 0                         | otherwise                  | 2 |
// | bollinger     | <lower → 2, >mid → 1             | >upper → 2, otherwise → 1  | 2 |
// | momentum      | both > 0 → 2, only 5d > 0 → 1    | both < 0 → 2, otherwise 1  | 2 |
// | cross         | sma5 & sma10 > sma20 → 3         | sma5 & sma10 < sma20 → 3   | 3 |
//
// `total_weight` is the sum of the listed weights (17) regardless of how many
// points each factor actually cast. A cross factor that sees neither a golden
// nor a death cross abstains but its weight stays in the total.
// =============================================================================

use serde::Serialize;

use crate::indicators::rsi::{OVERBOUGHT, OVERSOLD};
use crate::indicators::IndicatorSnapshot;

/// A single factor's verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "side", content = "points", rename_all = "lowercase")]
pub enum Vote {
    Bullish(u32),
    Bearish(u32),
    Abstain,
}

/// One row of the voting table.
pub struct Factor {
    pub name: &'static str,
    /// Listed weight, counted into the total whatever the vote.
    pub weight: u32,
    pub vote: fn(&IndicatorSnapshot, f64) -> Vote,
}

impl std::fmt::Debug for Factor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Factor")
            .field("name", &self.name)
            .field("weight", &self.weight)
            .finish()
    }
}

/// The contribution of a single factor to the final score.
#[derive(Debug, Clone, Serialize)]
pub struct SignalContribution {
    pub name: &'static str,
    pub weight: u32,
    pub vote: Vote,
}

/// Result of the weighted scoring pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct ScoringResult {
    pub bullish_weight: u32,
    pub bearish_weight: u32,
    pub total_weight: u32,
    pub signal_contributions: Vec<SignalContribution>,
}

impl ScoringResult {
    pub fn bullish_score(&self) -> f64 {
        ratio(self.bullish_weight, self.total_weight)
    }

    pub fn bearish_score(&self) -> f64 {
        ratio(self.bearish_weight, self.total_weight)
    }
}

fn ratio(part: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

// =============================================================================
// Factor table
// =============================================================================

pub static FACTORS: &[Factor] = &[
    Factor { name: "short_trend", weight: 3, vote: short_trend },
    Factor { name: "medium_trend", weight: 2, vote: medium_trend },
    Factor { name: "long_trend", weight: 1, vote: long_trend },
    Factor { name: "rsi", weight: 2, vote: rsi },
    Factor { name: "macd", weight: 2, vote: macd },
    Factor { name: "bollinger", weight: 2, vote: bollinger },
    Factor { name: "momentum", weight: 2, vote: momentum },
    Factor { name: "cross", weight: 3, vote: cross },
];

fn binary(bullish: bool, weight: u32) -> Vote {
    if bullish {
        Vote::Bullish(weight)
    } else {
        Vote::Bearish(weight)
    }
}

fn short_trend(s: &IndicatorSnapshot, price: f64) -> Vote {
    binary(price > s.sma5, 3)
}

fn medium_trend(s: &IndicatorSnapshot, _price: f64) -> Vote {
    binary(s.sma10 > s.sma20, 2)
}

fn long_trend(s: &IndicatorSnapshot, _price: f64) -> Vote {
    binary(s.sma20 > s.sma50, 1)
}

fn rsi(s: &IndicatorSnapshot, _price: f64) -> Vote {
    if s.rsi < OVERSOLD {
        Vote::Bullish(2)
    } else if s.rsi > OVERBOUGHT {
        Vote::Bearish(2)
    } else if s.rsi > 50.0 {
        Vote::Bullish(1)
    } else {
        Vote::Bearish(1)
    }
}

fn macd(s: &IndicatorSnapshot, _price: f64) -> Vote {
    binary(s.macd > 0.0, 2)
}

fn bollinger(s: &IndicatorSnapshot, price: f64) -> Vote {
    if price > s.upper_band {
        Vote::Bearish(2)
    } else if price < s.lower_band {
        Vote::Bullish(2)
    } else if price > s.sma20_bb {
        Vote::Bullish(1)
    } else {
        Vote::Bearish(1)
    }
}

fn momentum(s: &IndicatorSnapshot, _price: f64) -> Vote {
    if s.momentum5 > 0.0 && s.momentum7 > 0.0 {
        Vote::Bullish(2)
    } else if s.momentum5 < 0.0 && s.momentum7 < 0.0 {
        Vote::Bearish(2)
    } else if s.momentum5 > 0.0 {
        Vote::Bullish(1)
    } else {
        Vote::Bearish(1)
    }
}

fn cross(s: &IndicatorSnapshot, _price: f64) -> Vote {
    if s.sma5 > s.sma20 && s.sma10 > s.sma20 {
        Vote::Bullish(3)
    } else if s.sma5 < s.sma20 && s.sma10 < s.sma20 {
        Vote::Bearish(3)
    } else {
        Vote::Abstain
    }
}

// =============================================================================
// Scoring
// =============================================================================

/// Run every factor in `FACTORS` against `snapshot` and sum the votes.
pub fn score_signals(snapshot: &IndicatorSnapshot, current_price: f64) -> ScoringResult {
    score_with(FACTORS, snapshot, current_price)
}

/// Score against an arbitrary factor table.
pub fn score_with(
    factors: &[Factor],
    snapshot: &IndicatorSnapshot,
    current_price: f64,
) -> ScoringResult {
    let mut result = ScoringResult {
        bullish_weight: 0,
        bearish_weight: 0,
        total_weight: 0,
        signal_contributions: Vec::with_capacity(factors.len()),
    };

    for factor in factors {
        let vote = (factor.vote)(snapshot, current_price);
        match vote {
            Vote::Bullish(points) => result.bullish_weight += points,
            Vote::Bearish(points) => result.bearish_weight += points,
            Vote::Abstain => {}
        }
        result.total_weight += factor.weight;
        result.signal_contributions.push(SignalContribution {
            name: factor.name,
            weight: factor.weight,
            vote,
        });
    }

    result
}
