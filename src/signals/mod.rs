// =============================================================================
// Signals Module
// =============================================================================
//
// Fixed-weight voting over an `IndicatorSnapshot`. Each factor in the table
// sends its vote to exactly one side (or abstains), and the scorer sums the
// two sides.

pub mod weighted_score;

pub use weighted_score::{score_signals, ScoringResult};
