//! Overall match scoring

use crate::config::ScoreWeights;
use crate::schema::LegacyEntry;

/// Condenses a comparison into a single 0..10 score.
///
/// The current formula is pure skill coverage. The weighted variant
/// (hot-tech, in-demand and level penalties from [`ScoreWeights`]) is
/// intentionally not applied yet.
pub struct Scorer {
    #[allow(dead_code)]
    weights: ScoreWeights,
}

impl Scorer {
    pub fn new(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    /// Coverage score: matched / (matched + missing), scaled to 0..10 and
    /// rounded to two decimals. Empty comparisons score 0.0.
    pub fn score(&self, matched: &[LegacyEntry], missing: &[LegacyEntry]) -> f64 {
        let matched_count = matched.len() as f64;
        let total = (matched.len() + missing.len()).max(1) as f64;
        let coverage = 10.0 * matched_count / total;

        // TODO: need to research this method before enabling it. Candidate
        // formula: subtract weights.miss per missing skill, weights.hot /
        // weights.ind extra for flagged skills, weights.level per
        // underqualified match; clamp afterwards.

        let score = (coverage * 100.0).round() / 100.0;
        score.clamp(0.0, 10.0)
    }
}
