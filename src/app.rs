//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and loads configuration
//! - installs logging
//! - runs the requested command pipeline
//! - prints reports and writes optional exports

use clap::Parser;
use tracing::debug;

use crate::cli::{Cli, Command, ScoresArgs, SummarizeArgs, WeightsArgs};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::io::export::write_export_json;
use crate::report::format;

use self::pipeline::SummaryOutput;

pub mod pipeline;

/// Entry point for the `placement` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    let mut config = AppConfig::load()?;
    if let Some(level) = &cli.log_level {
        config.telemetry.log_level = level.clone();
    }
    crate::telemetry::init(&config.telemetry)?;
    debug!(?config, "configuration loaded");

    match cli.command {
        Command::Summarize(args) => handle_summarize(args),
        Command::Scores(args) => handle_scores(args, &config),
        Command::Weights(args) => handle_weights(args),
    }
}

fn handle_summarize(args: SummarizeArgs) -> Result<(), AppError> {
    match pipeline::run_summary(&args.solution, args.option.as_deref())? {
        SummaryOutput::Placement(run) => {
            println!("{}", format::format_placement_summary(&run.ingest, &run.report));
            if let Some(path) = &args.export {
                write_export_json(path, "summarize", &run.report)?;
            }
        }
        SummaryOutput::Options(comparison) => {
            println!("{}", format::format_option_comparison(&comparison));
            if let Some(path) = &args.export {
                write_export_json(path, "summarize", &comparison)?;
            }
        }
    }
    Ok(())
}

fn handle_scores(args: ScoresArgs, config: &AppConfig) -> Result<(), AppError> {
    let scale = args.scale.unwrap_or(config.score_scale);
    let default_layer = args.default_layer.as_deref().unwrap_or(&config.default_layer);
    if default_layer.trim().is_empty() {
        return Err(AppError::new(2, "`--default-layer` must not be blank."));
    }

    let scores = pipeline::run_scores(&args.scores, scale, default_layer)?;

    println!("{}", format::format_scores(&scores));

    if let Some(path) = &args.export {
        write_export_json(path, "scores", &scores.scores)?;
    }
    Ok(())
}

fn handle_weights(args: WeightsArgs) -> Result<(), AppError> {
    let request = pipeline::build_weight_request(&args.sublimits, args.importance.as_deref(), args.reset)?;

    let json = serde_json::to_string_pretty(&request)
        .map_err(|e| AppError::new(4, format!("Failed to serialize weight request: {e}")))?;
    println!("{json}");

    if let Some(path) = &args.export {
        write_export_json(path, "weights", &request)?;
    }
    Ok(())
}
