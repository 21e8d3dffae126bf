//! Scoring API results: scale conversion and carrier/layer resolution.
//!
//! The scoring path reports coverage on its own scale (0-100 by contract).
//! `resolve_scale` decides how to read a batch, `to_coverage` converts a raw
//! value, and `resolve_scores` turns the records into a ranked, display-ready
//! list.

use std::cmp::Ordering;

use tracing::debug;

use crate::domain::{CoverageScore, ResolvedScore, ScoreRecord, ScoreScale};

pub mod decompose;

pub use decompose::{CarrierLayer, DEFAULT_LAYER, Decomposer};

/// Resolve `ScoreScale::Auto` against a batch of raw values.
///
/// The returned scale is never `Auto`. The note describes any conversion so the
/// caller can surface it.
pub fn resolve_scale(raw_values: &[f64], declared: ScoreScale) -> (ScoreScale, Option<&'static str>) {
    match declared {
        ScoreScale::Percent => (ScoreScale::Percent, None),
        ScoreScale::Fraction => (ScoreScale::Fraction, Some("scale: fraction→percent (×100)")),
        ScoreScale::Auto => {
            let max = raw_values
                .iter()
                .copied()
                .filter(|v| v.is_finite())
                .fold(f64::NEG_INFINITY, f64::max);
            if max.is_finite() && max <= 1.0 {
                (ScoreScale::Fraction, Some("scale: auto fraction→percent (×100)"))
            } else {
                (ScoreScale::Percent, None)
            }
        }
    }
}

/// Convert a raw score on a resolved scale. `Auto` is read as percent.
pub fn to_coverage(raw: f64, scale: ScoreScale) -> CoverageScore {
    match scale {
        ScoreScale::Fraction => CoverageScore::from_fraction(raw),
        ScoreScale::Percent | ScoreScale::Auto => CoverageScore::from_percent(raw),
    }
}

/// Decompose every record and rank by coverage, highest first (stable for ties).
pub fn resolve_scores(records: &[ScoreRecord], decomposer: &Decomposer) -> Vec<ResolvedScore> {
    let mut resolved: Vec<ResolvedScore> = records.iter().map(|r| decomposer.resolve(r)).collect();
    rank_scores(&mut resolved);
    debug!(count = resolved.len(), "resolved coverage scores");
    resolved
}

pub fn rank_scores(scores: &mut [ResolvedScore]) {
    scores.sort_by(|a, b| {
        b.coverage_score
            .partial_cmp(&a.coverage_score)
            .unwrap_or(Ordering::Equal)
    });
}
