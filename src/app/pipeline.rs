//! Shared command workflows.
//!
//! Each function here runs one command end to end without printing:
//! ingest -> engine -> result struct. `app` then focuses on presentation.

use std::collections::BTreeMap;
use std::path::Path;

use rayon::prelude::*;
use tracing::info;

use crate::domain::ScoreScale;
use crate::error::AppError;
use crate::io::ingest::{self, IngestedOptions, IngestedScores, IngestedSolution, SolutionInput};
use crate::report::{OptionComparison, OptionSummary, PlacementReport};
use crate::scores::Decomposer;
use crate::weights::{self, WeightRequest};

/// All computed outputs of a single `summarize` run.
#[derive(Debug, Clone)]
pub struct SummaryRun {
    pub ingest: IngestedSolution,
    pub report: PlacementReport,
}

/// What `summarize` produced: one placement, or a generated option set side by side.
#[derive(Debug, Clone)]
pub enum SummaryOutput {
    Placement(SummaryRun),
    Options(OptionComparison),
}

/// `option` picks one placement out of a generated option set; without it a
/// set is compared option by option.
pub fn run_summary(solution: &Path, option: Option<&str>) -> Result<SummaryOutput, AppError> {
    match (ingest::load_solution_input(solution)?, option) {
        (SolutionInput::Single(ingest), None) => Ok(SummaryOutput::Placement(summarize(ingest))),
        (SolutionInput::Single(_), Some(_)) => Err(AppError::new(
            2,
            "`--option` applies only to a generated option set (an object with `options`).",
        )),
        (SolutionInput::Options(set), Some(id)) => {
            let chosen = set.select(id)?;
            info!(option = chosen.option_id.as_str(), "selected generated option");
            Ok(SummaryOutput::Placement(summarize(chosen.ingest)))
        }
        (SolutionInput::Options(set), None) => Ok(SummaryOutput::Options(compare_options(set))),
    }
}

/// Aggregate an already-ingested solution.
pub fn summarize(ingest: IngestedSolution) -> SummaryRun {
    let report = PlacementReport::build(&ingest.quotes);
    info!(
        layers = report.layers.len(),
        carriers = report.carriers.len(),
        "aggregated placement"
    );
    SummaryRun { ingest, report }
}

/// Aggregate every option of a set. Options are independent, so they build on the rayon pool.
pub fn compare_options(set: IngestedOptions) -> OptionComparison {
    let options: Vec<OptionSummary> = set
        .options
        .into_par_iter()
        .map(|option| OptionSummary {
            option_id: option.option_id,
            reported_premium: option.ingest.reported.total_premium,
            reported_coverage: option.ingest.reported.avg_coverage,
            rows_skipped: option.ingest.row_errors.len(),
            report: PlacementReport::build(&option.ingest.quotes),
        })
        .collect();
    info!(options = options.len(), "compared generated options");

    OptionComparison {
        min_premium: set.min_premium,
        max_premium: set.max_premium,
        options,
    }
}

pub fn run_scores(path: &Path, scale: ScoreScale, default_layer: &str) -> Result<IngestedScores, AppError> {
    let decomposer = Decomposer::new(default_layer);
    ingest::load_scores(path, scale, &decomposer)
}

/// Build the weight request from CLI inputs.
///
/// `importance` is a JSON object of sublimit id to integer level.
pub fn build_weight_request(
    sublimits: &[String],
    importance: Option<&str>,
    reset: bool,
) -> Result<WeightRequest, AppError> {
    let ids: Vec<String> = sublimits
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if ids.is_empty() {
        return Err(AppError::new(2, "`--sublimits` needs at least one non-empty id."));
    }

    if reset {
        return Ok(weights::reset_weights(&ids));
    }

    let overrides: BTreeMap<String, i64> = match importance {
        Some(json) => serde_json::from_str(json).map_err(|e| {
            AppError::new(2, format!("Invalid `--importance` JSON (expected {{\"id\": level}}): {e}"))
        })?,
        None => BTreeMap::new(),
    };

    Ok(weights::build_weights(&ids, &overrides)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn weight_request_applies_overrides() {
        let request = build_weight_request(&ids(&["flood", " bi "]), Some(r#"{"flood": 0}"#), false).unwrap();
        assert!((request.weights["flood"] - 0.01).abs() < 1e-12);
        assert!((request.weights["bi"] - 0.14).abs() < 1e-12);
    }

    #[test]
    fn weight_request_errors_are_input_errors() {
        let err = build_weight_request(&ids(&["flood"]), Some(r#"{"flood": 9}"#), false).unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let err = build_weight_request(&ids(&["flood"]), Some("not json"), false).unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let err = build_weight_request(&ids(&[" "]), None, false).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn reset_ignores_missing_overrides() {
        let request = build_weight_request(&ids(&["flood"]), None, true).unwrap();
        assert!((request.weights["flood"] - 0.14).abs() < 1e-12);
    }

    #[test]
    fn option_sets_are_compared_in_payload_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        std::fs::write(
            &path,
            r#"{"options": [
                {"option_id": 3, "Achieved Premium": 50000.0, "solution": [
                    {"Layer": "Primary", "Carrier": "AIG", "Premium": 100000, "Capacity": 2,
                     "AllocationPercentage": 50, "Coverage_Score": 0.5},
                    {"Layer": "Primary", "Carrier": "Bad", "Premium": 1, "Capacity": -1,
                     "AllocationPercentage": 50, "Coverage_Score": 0.5}]},
                {"option_id": 1, "solution": [
                    {"Layer": "Excess1", "Carrier": "Chubb", "Premium": 90000, "Capacity": 3,
                     "AllocationPercentage": 100, "Coverage_Score": 0.8}]}
            ]}"#,
        )
        .unwrap();

        let SummaryOutput::Options(comparison) = run_summary(&path, None).unwrap() else {
            panic!("expected an option comparison");
        };
        let ids: Vec<&str> = comparison.options.iter().map(|o| o.option_id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1"]);
        assert_eq!(comparison.options[0].reported_premium, Some(50_000.0));
        assert_eq!(comparison.options[0].rows_skipped, 1);
        assert!((comparison.options[1].report.totals.total_capacity - 3.0).abs() < 1e-12);

        let SummaryOutput::Placement(run) = run_summary(&path, Some("1")).unwrap() else {
            panic!("expected a single placement");
        };
        assert_eq!(run.report.carriers[0].carrier, "Chubb");
        assert_eq!(run_summary(&path, Some("9")).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn option_flag_needs_an_option_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("solution.json");
        std::fs::write(
            &path,
            r#"[{"Layer": "Primary", "Carrier": "AIG", "Premium": 1, "Capacity": 1,
                "AllocationPercentage": 100, "Coverage_Score": 0.5}]"#,
        )
        .unwrap();
        assert_eq!(run_summary(&path, Some("0")).unwrap_err().exit_code(), 2);
        assert!(matches!(run_summary(&path, None).unwrap(), SummaryOutput::Placement(_)));
    }
}
