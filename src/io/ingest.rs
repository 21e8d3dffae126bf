//! JSON ingest for optimizer solutions and scoring-API results.
//!
//! Both upstream payloads are known to be inconsistent. This module turns them
//! into validated engine records:
//! - **Envelope tolerance** (bare arrays, optimize responses, generated option sets)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **One scale conversion** for coverage scores, done here and nowhere else

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::{
    CoverageScore, LayerField, LayerId, QuoteRecord, RatingRaw, ResolvedScore, ScoreRecord, ScoreScale,
};
use crate::error::AppError;
use crate::scores::{self, Decomposer};

/// Reported signed values may differ from the derived ones by this much before
/// the row is counted as a mismatch.
const SIGNED_TOLERANCE: f64 = 1e-6;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    /// Zero-based position in the payload array.
    pub index: usize,
    pub carrier: Option<String>,
    pub message: String,
}

/// Totals the optimizer reported alongside a solution. Informational only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ReportedTotals {
    pub total_premium: Option<f64>,
    /// 0-1 fraction, as reported.
    pub avg_coverage: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct IngestedSolution {
    pub quotes: Vec<QuoteRecord>,
    pub reported: ReportedTotals,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
    /// Rows whose upstream `SignedCapacity`/`SignedPremium` disagreed with the derived values.
    pub signed_mismatches: usize,
}

/// One candidate placement out of a generated option set.
#[derive(Debug, Clone)]
pub struct IngestedOption {
    pub option_id: String,
    pub ingest: IngestedSolution,
}

/// A generated option set, options in payload order.
#[derive(Debug, Clone)]
pub struct IngestedOptions {
    pub min_premium: Option<f64>,
    pub max_premium: Option<f64>,
    pub options: Vec<IngestedOption>,
}

impl IngestedOptions {
    /// Take the option with `option_id`; unknown ids are input errors.
    pub fn select(self, option_id: &str) -> Result<IngestedOption, AppError> {
        let known: Vec<String> = self.options.iter().map(|o| o.option_id.clone()).collect();
        self.options
            .into_iter()
            .find(|o| o.option_id == option_id.trim())
            .ok_or_else(|| {
                AppError::new(
                    2,
                    format!("No option `{option_id}` in the payload (available: {}).", known.join(", ")),
                )
            })
    }
}

/// What a solution file turned out to hold.
#[derive(Debug, Clone)]
pub enum SolutionInput {
    Single(IngestedSolution),
    Options(IngestedOptions),
}

#[derive(Debug, Clone)]
pub struct IngestedScores {
    /// Ranked by coverage score, highest first.
    pub scores: Vec<ResolvedScore>,
    /// Resolved scale (never `Auto`).
    pub scale: ScoreScale,
    /// Optional informational note about how the scores were interpreted.
    pub scale_note: Option<String>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SolutionPayload {
    Rows(Vec<Value>),
    Optimized {
        solution: Vec<Value>,
        #[serde(default)]
        summary: Option<OptimizeSummary>,
    },
    Options {
        #[serde(default)]
        min_premium: Option<f64>,
        #[serde(default)]
        max_premium: Option<f64>,
        options: Vec<OptionPayload>,
    },
}

/// `summary` block of an optimize response. `layer_stats` is recomputed here, so it is not read.
#[derive(Debug, Default, Deserialize)]
struct OptimizeSummary {
    #[serde(default)]
    total_premium: Option<f64>,
    #[serde(default)]
    avg_coverage_score: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OptionPayload {
    #[serde(default)]
    option_id: Option<Value>,
    #[serde(rename = "Achieved Premium", default)]
    achieved_premium: Option<f64>,
    #[serde(rename = "Achieved Average Coverage", default)]
    achieved_coverage: Option<f64>,
    solution: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScoresPayload {
    Rows(Vec<Value>),
    Wrapped { scores: Vec<Value> },
}

/// One optimizer solution row as it arrives on the wire.
#[derive(Debug, Deserialize)]
struct SolutionRow {
    #[serde(rename = "Layer")]
    layer: Option<String>,
    #[serde(rename = "Carrier")]
    carrier: Option<String>,
    #[serde(rename = "Premium")]
    premium: Option<f64>,
    #[serde(rename = "Capacity")]
    capacity: Option<f64>,
    #[serde(rename = "SignedCapacity")]
    signed_capacity: Option<f64>,
    #[serde(rename = "SignedPremium")]
    signed_premium: Option<f64>,
    #[serde(rename = "AllocationPercentage")]
    allocation_percentage: Option<f64>,
    #[serde(rename = "Coverage_Score")]
    coverage_score: Option<f64>,
    #[serde(rename = "CreditRating")]
    credit_rating: Option<RatingRaw>,
    #[serde(rename = "Credit_Rating")]
    credit_rating_alt: Option<RatingRaw>,
    #[serde(rename = "CreditRatingValue")]
    credit_rating_value: Option<RatingRaw>,
    #[serde(rename = "QuoteID")]
    quote_id: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ScoreRow {
    carrier: String,
    #[serde(default)]
    layer: Option<LayerField>,
    #[serde(default)]
    quote_id: Option<Value>,
    coverage_score: f64,
}

pub fn load_solution_input(path: &Path) -> Result<SolutionInput, AppError> {
    let text = read_payload(path)?;
    parse_solution_input(&text)
}

/// Parse a payload expected to hold exactly one solution.
///
/// A generated option set is rejected here; callers that accept one go through
/// `parse_solution_input` and pick an option.
pub fn parse_solution(text: &str) -> Result<IngestedSolution, AppError> {
    match parse_solution_input(text)? {
        SolutionInput::Single(ingest) => Ok(ingest),
        SolutionInput::Options(set) => Err(AppError::new(
            2,
            format!(
                "Payload holds {} generated placement options; choose one with `--option <id>`.",
                set.options.len()
            ),
        )),
    }
}

/// Parse any solution payload: a bare row array, an optimize response
/// (`{ "solution": [...], "summary": {...} }`) or a generated option set
/// (`{ "options": [{ "option_id", "solution": [...] }, ...] }`).
pub fn parse_solution_input(text: &str) -> Result<SolutionInput, AppError> {
    let payload: SolutionPayload = serde_json::from_str(text).map_err(|e| {
        AppError::new(
            2,
            format!(
                "Invalid solution JSON (expected an array, an object with `solution`, or an object with `options`): {e}"
            ),
        )
    })?;

    match payload {
        SolutionPayload::Rows(rows) => single(ingest_rows(rows, ReportedTotals::default(), "solution")),
        SolutionPayload::Optimized { solution, summary } => {
            let summary = summary.unwrap_or_default();
            let reported = ReportedTotals {
                total_premium: summary.total_premium,
                avg_coverage: summary.avg_coverage_score,
            };
            single(ingest_rows(solution, reported, "solution"))
        }
        SolutionPayload::Options {
            min_premium,
            max_premium,
            options,
        } => ingest_options(min_premium, max_premium, options).map(SolutionInput::Options),
    }
}

fn single(ingest: IngestedSolution) -> Result<SolutionInput, AppError> {
    if ingest.rows_read > 0 && ingest.rows_used == 0 {
        return Err(AppError::new(3, "No valid quotes remain after validating the solution rows."));
    }
    info!(rows_read = ingest.rows_read, rows_used = ingest.rows_used, "ingested optimizer solution");
    Ok(SolutionInput::Single(ingest))
}

/// Options whose rows all fail validation are dropped; if that leaves nothing
/// out of a non-empty set, the whole payload is unusable.
fn ingest_options(
    min_premium: Option<f64>,
    max_premium: Option<f64>,
    payloads: Vec<OptionPayload>,
) -> Result<IngestedOptions, AppError> {
    let offered = payloads.len();
    let mut options = Vec::with_capacity(offered);

    for (index, payload) in payloads.into_iter().enumerate() {
        let option_id = payload
            .option_id
            .as_ref()
            .and_then(id_text)
            .unwrap_or_else(|| index.to_string());
        let reported = ReportedTotals {
            total_premium: payload.achieved_premium,
            avg_coverage: payload.achieved_coverage,
        };
        let ingest = ingest_rows(payload.solution, reported, "option");

        if ingest.rows_read > 0 && ingest.rows_used == 0 {
            warn!(option = option_id.as_str(), rows = ingest.rows_read, "dropped option with no valid rows");
            continue;
        }
        options.push(IngestedOption { option_id, ingest });
    }

    if offered > 0 && options.is_empty() {
        return Err(AppError::new(3, "No generated option has a valid quote row."));
    }
    info!(offered, kept = options.len(), "ingested generated options");

    Ok(IngestedOptions {
        min_premium,
        max_premium,
        options,
    })
}

fn ingest_rows(rows: Vec<Value>, reported: ReportedTotals, source: &str) -> IngestedSolution {
    let rows_read = rows.len();
    let mut quotes = Vec::with_capacity(rows_read);
    let mut row_errors = Vec::new();
    let mut signed_mismatches = 0usize;

    for (index, value) in rows.into_iter().enumerate() {
        let carrier = carrier_hint(&value, "Carrier");
        let row: SolutionRow = match serde_json::from_value(value) {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    index,
                    carrier,
                    message: format!("malformed row: {e}"),
                });
                continue;
            }
        };

        match quote_from_row(row) {
            Ok((quote, mismatch)) => {
                if mismatch {
                    signed_mismatches += 1;
                }
                quotes.push(quote);
            }
            Err(message) => row_errors.push(RowError {
                index,
                carrier,
                message,
            }),
        }
    }

    log_row_errors(source, &row_errors);
    if signed_mismatches > 0 {
        debug!(rows = signed_mismatches, "upstream signed values ignored in favor of derived ones");
    }

    IngestedSolution {
        rows_used: quotes.len(),
        quotes,
        reported,
        row_errors,
        rows_read,
        signed_mismatches,
    }
}

fn quote_from_row(row: SolutionRow) -> Result<(QuoteRecord, bool), String> {
    let carrier = row
        .carrier
        .filter(|c| !c.trim().is_empty())
        .ok_or("missing `Carrier`")?;
    let layer_raw = row.layer.ok_or("missing `Layer`")?;
    let layer = LayerId::parse(&layer_raw).ok_or_else(|| format!("unknown layer `{layer_raw}`"))?;
    let pct = row
        .allocation_percentage
        .ok_or("missing `AllocationPercentage`")?;
    let coverage = row.coverage_score.ok_or("missing `Coverage_Score`")?;

    let capacity = offered_amount(row.capacity, row.signed_capacity, pct)
        .ok_or("missing `Capacity` (and no `SignedCapacity` to derive it from)")?;
    let premium = offered_amount(row.premium, row.signed_premium, pct)
        .ok_or("missing `Premium` (and no `SignedPremium` to derive it from)")?;

    // Optimizer coverage is a 0-1 fraction.
    let mut quote = QuoteRecord::new(
        carrier,
        layer,
        premium,
        capacity,
        pct,
        CoverageScore::from_fraction(coverage),
    )
    .map_err(|e| e.to_string())?;

    if let Some(rating) = row
        .credit_rating
        .or(row.credit_rating_alt)
        .or(row.credit_rating_value)
    {
        quote = quote.with_rating(rating);
    }
    if let Some(id) = row.quote_id.as_ref().and_then(id_text) {
        quote = quote.with_quote_id(id);
    }

    let mismatch = differs(row.signed_capacity, quote.signed_capacity())
        || differs(row.signed_premium, quote.signed_premium());
    Ok((quote, mismatch))
}

/// The raw offer, or the signed value scaled back up by its allocation.
fn offered_amount(raw: Option<f64>, signed: Option<f64>, pct: f64) -> Option<f64> {
    match (raw, signed) {
        (Some(v), _) => Some(v),
        (None, Some(s)) if pct > 0.0 => Some(s * 100.0 / pct),
        _ => None,
    }
}

fn differs(reported: Option<f64>, derived: f64) -> bool {
    reported.is_some_and(|r| (r - derived).abs() > SIGNED_TOLERANCE * derived.abs().max(1.0))
}

pub fn load_scores(path: &Path, scale: ScoreScale, decomposer: &Decomposer) -> Result<IngestedScores, AppError> {
    let text = read_payload(path)?;
    parse_scores(&text, scale, decomposer)
}

/// Parse a scoring-API result (bare array or `{ "scores": [...] }`).
///
/// The declared `scale` is resolved against the whole batch before any value
/// is converted, so every record in one payload lands on the same scale.
pub fn parse_scores(text: &str, scale: ScoreScale, decomposer: &Decomposer) -> Result<IngestedScores, AppError> {
    let payload: ScoresPayload = serde_json::from_str(text).map_err(|e| {
        AppError::new(
            2,
            format!("Invalid scores JSON (expected an array or an object with `scores`): {e}"),
        )
    })?;
    let rows = match payload {
        ScoresPayload::Rows(rows) | ScoresPayload::Wrapped { scores: rows } => rows,
    };

    let rows_read = rows.len();
    let mut parsed: Vec<(usize, ScoreRow)> = Vec::with_capacity(rows_read);
    let mut row_errors = Vec::new();

    for (index, value) in rows.into_iter().enumerate() {
        let carrier = carrier_hint(&value, "carrier");
        match serde_json::from_value::<ScoreRow>(value) {
            Ok(row) => parsed.push((index, row)),
            Err(e) => row_errors.push(RowError {
                index,
                carrier,
                message: format!("malformed row: {e}"),
            }),
        }
    }

    let raw: Vec<f64> = parsed.iter().map(|(_, r)| r.coverage_score).collect();
    let (resolved_scale, note) = scores::resolve_scale(&raw, scale);
    if let Some(note) = note {
        info!(note, "coverage score scale");
    }

    let mut records = Vec::with_capacity(parsed.len());
    for (index, row) in parsed {
        let coverage = scores::to_coverage(row.coverage_score, resolved_scale);
        if !coverage.is_in_range() {
            row_errors.push(RowError {
                index,
                carrier: Some(row.carrier),
                message: format!(
                    "coverage_score {} is outside [0, 100] after conversion",
                    row.coverage_score
                ),
            });
            continue;
        }
        records.push(ScoreRecord {
            raw_carrier_field: row.carrier,
            explicit_layer_field: row.layer,
            quote_id: row.quote_id.as_ref().and_then(id_text),
            coverage_score: coverage,
        });
    }
    row_errors.sort_by_key(|e| e.index);
    log_row_errors("scores", &row_errors);

    let rows_used = records.len();
    if rows_read > 0 && rows_used == 0 {
        return Err(AppError::new(3, "No valid score records remain after validation."));
    }
    info!(rows_read, rows_used, "ingested coverage scores");

    Ok(IngestedScores {
        scores: scores::resolve_scores(&records, decomposer),
        scale: resolved_scale,
        scale_note: note.map(str::to_string),
        row_errors,
        rows_read,
        rows_used,
    })
}

fn read_payload(path: &Path) -> Result<String, AppError> {
    fs::read_to_string(path)
        .map_err(|e| AppError::new(2, format!("Failed to read '{}': {e}", path.display())))
}

fn carrier_hint(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Quote ids arrive as strings or numbers.
fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn log_row_errors(source: &str, errors: &[RowError]) {
    for e in errors {
        warn!(
            source,
            index = e.index,
            carrier = e.carrier.as_deref().unwrap_or("-"),
            "skipped row: {}",
            e.message
        );
    }
}
