//! Command-line parsing for the placement engine.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! aggregation code. Values left unset here fall back to `AppConfig`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::ScoreScale;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "placement",
    version,
    about = "Placement allocation and coverage aggregation for optimizer results"
)]
pub struct Cli {
    /// Log filter (overrides PLACEMENT_LOG_LEVEL; RUST_LOG still wins).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Summarize an optimizer solution by layer, carrier and rating.
    Summarize(SummarizeArgs),
    /// Resolve and rank a scoring-API result.
    Scores(ScoresArgs),
    /// Build the sublimit weight request payload.
    Weights(WeightsArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct SummarizeArgs {
    /// Optimizer solution JSON: array of rows, optimize response, or generated option set.
    #[arg(long, value_name = "JSON")]
    pub solution: PathBuf,

    /// Summarize one option of a generated set instead of comparing them all.
    #[arg(long, value_name = "ID")]
    pub option: Option<String>,

    /// Write the full report to a JSON file.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct ScoresArgs {
    /// Scoring-API result JSON (array or `{ "scores": [...] }`).
    #[arg(long, value_name = "JSON")]
    pub scores: PathBuf,

    /// Scale of `coverage_score` in the payload.
    #[arg(long, value_enum)]
    pub scale: Option<ScoreScale>,

    /// Layer used when a carrier string names none.
    #[arg(long)]
    pub default_layer: Option<String>,

    /// Write the ranked scores to a JSON file.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct WeightsArgs {
    /// Sublimit ids, comma separated.
    #[arg(long, value_delimiter = ',', required = true)]
    pub sublimits: Vec<String>,

    /// JSON object of importance overrides, e.g. `{"flood": 4}`.
    #[arg(long, value_name = "JSON", conflicts_with = "reset")]
    pub importance: Option<String>,

    /// Force every sublimit back to neutral importance.
    #[arg(long)]
    pub reset: bool,

    /// Write the request payload to a JSON file.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_weights_list_and_flags() {
        let cli = Cli::parse_from([
            "placement",
            "weights",
            "--sublimits",
            "flood,bi",
            "--importance",
            r#"{"flood":4}"#,
        ]);
        let Command::Weights(args) = cli.command else {
            panic!("expected weights");
        };
        assert_eq!(args.sublimits, vec!["flood", "bi"]);
        assert!(!args.reset);
    }

    #[test]
    fn reset_conflicts_with_importance() {
        let res = Cli::try_parse_from([
            "placement",
            "weights",
            "--sublimits",
            "flood",
            "--importance",
            "{}",
            "--reset",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn scores_scale_is_optional() {
        let cli = Cli::parse_from(["placement", "scores", "--scores", "s.json", "--scale", "auto"]);
        let Command::Scores(args) = cli.command else {
            panic!("expected scores");
        };
        assert_eq!(args.scale, Some(ScoreScale::Auto));
        assert!(args.default_layer.is_none());
    }

    #[test]
    fn summarize_option_is_optional() {
        let cli = Cli::parse_from(["placement", "summarize", "--solution", "o.json", "--option", "4"]);
        let Command::Summarize(args) = cli.command else {
            panic!("expected summarize");
        };
        assert_eq!(args.option.as_deref(), Some("4"));

        let cli = Cli::parse_from(["placement", "summarize", "--solution", "o.json"]);
        let Command::Summarize(args) = cli.command else {
            panic!("expected summarize");
        };
        assert!(args.option.is_none());
    }
}
