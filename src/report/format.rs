//! Formatted terminal output for placement reports and score rankings.
//!
//! We keep formatting code in one place so:
//! - the aggregation code stays clean and testable
//! - output changes are localized

use crate::domain::LayerId;
use crate::io::ingest::{IngestedScores, IngestedSolution, RowError};
use crate::rating;
use crate::report::{OptionComparison, PlacementReport};

/// Format the full `summarize` output.
pub fn format_placement_summary(ingest: &IngestedSolution, report: &PlacementReport) -> String {
    let mut out = String::new();

    out.push_str("=== placement - Allocation Summary ===\n");
    out.push_str(&format!(
        "Rows: read={} used={} skipped={}\n",
        ingest.rows_read,
        ingest.rows_used,
        ingest.row_errors.len()
    ));
    if ingest.signed_mismatches > 0 {
        out.push_str(&format!(
            "Note: {} row(s) reported signed values that disagree with capacity x allocation; derived values used.\n",
            ingest.signed_mismatches
        ));
    }

    let t = &report.totals;
    out.push_str(&format!(
        "Placement: premium={} capacity={} coverage={} carriers={} diversity={}\n",
        fmt_money(t.total_premium),
        fmt_capacity(t.total_capacity),
        fmt_pct(t.weighted_coverage.as_percent()),
        t.carriers_used,
        t.diversity_ratio.map(|r| format!("{r:.2}x")).unwrap_or_else(|| "-".to_string()),
    ));
    if let Some(reported) = ingest.reported.total_premium {
        out.push_str(&format!("  (optimizer reported premium={})\n", fmt_money(reported)));
    }
    if let Some(reported) = ingest.reported.avg_coverage {
        out.push_str(&format!(
            "  (optimizer reported coverage={})\n",
            fmt_pct(reported * 100.0)
        ));
    }

    let b = &report.book;
    out.push_str(&format!(
        "Quote book: quotes={} carriers={} allocated={} offered_premium={} offered_capacity={} mean_coverage={}\n",
        b.quote_count,
        b.distinct_carriers,
        b.allocated_quotes,
        fmt_money(b.offered_premium),
        fmt_capacity(b.offered_capacity),
        fmt_pct(b.mean_coverage.as_percent()),
    ));

    out.push_str("\nBy layer:\n");
    out.push_str(&format_layers(report));
    out.push_str("\nBy carrier:\n");
    out.push_str(&format_carriers(report));
    out.push_str("\nBy rating:\n");
    out.push_str(&format_ratings(report));

    if !ingest.row_errors.is_empty() {
        out.push('\n');
        out.push_str(&format_row_errors(&ingest.row_errors));
    }

    out
}

fn format_layers(report: &PlacementReport) -> String {
    let mut out = String::new();
    push_line(
        &mut out,
        format!(
            "{:<14} {:>10} {:>10} {:>14} {:>9} {:>8}",
            "layer", "signed", "offered", "premium", "coverage", "carriers"
        ),
    );
    push_line(&mut out, rule(&[14, 10, 10, 14, 9, 8]));

    for l in &report.layers {
        let flag = if l.degenerate { " (no allocation)" } else { "" };
        push_line(
            &mut out,
            format!(
                "{:<14} {:>10} {:>10} {:>14} {:>9} {:>8}{flag}",
                l.layer.tower_label(),
                fmt_capacity(l.total_capacity),
                fmt_capacity(l.offered_capacity),
                fmt_money(l.total_premium),
                fmt_pct(l.weighted_coverage.as_percent()),
                l.carrier_count,
            ),
        );
    }
    out
}

fn format_carriers(report: &PlacementReport) -> String {
    let mut out = String::new();
    push_line(
        &mut out,
        format!(
            "{:<24} {:>10} {:>14} {:>9} {:>6} {:<20}",
            "carrier", "signed", "premium", "coverage", "quotes", "layers"
        ),
    );
    push_line(&mut out, rule(&[24, 10, 14, 9, 6, 20]));

    for c in &report.carriers {
        push_line(
            &mut out,
            format!(
                "{:<24} {:>10} {:>14} {:>9} {:>6} {:<20}",
                truncate(&c.carrier, 24),
                fmt_capacity(c.total_capacity),
                fmt_money(c.total_premium),
                fmt_pct(c.weighted_coverage.as_percent()),
                c.quote_count,
                fmt_layers(&c.layers),
            ),
        );
    }
    out
}

fn format_ratings(report: &PlacementReport) -> String {
    let mut out = String::new();
    push_line(
        &mut out,
        format!(
            "{:<10} {:>10} {:>14} {:>6} {:<17}",
            "rating", "signed", "premium", "quotes", "badge"
        ),
    );
    push_line(&mut out, rule(&[10, 10, 14, 6, 17]));

    for r in &report.ratings {
        let style = rating::style_for(&r.rating);
        push_line(
            &mut out,
            format!(
                "{:<10} {:>10} {:>14} {:>6} {}/{}",
                truncate(&r.rating, 10),
                fmt_capacity(r.total_capacity),
                fmt_money(r.total_premium),
                r.quote_count,
                style.background,
                style.foreground,
            ),
        );
    }
    out
}

/// Format the side-by-side view of a generated option set.
pub fn format_option_comparison(comparison: &OptionComparison) -> String {
    let mut out = String::new();

    out.push_str("=== placement - Option Comparison ===\n");
    out.push_str(&format!("Options: {}\n", comparison.options.len()));
    if let (Some(min), Some(max)) = (comparison.min_premium, comparison.max_premium) {
        out.push_str(&format!(
            "Premium range searched: {} .. {}\n",
            fmt_money(min),
            fmt_money(max)
        ));
    }
    out.push('\n');

    push_line(
        &mut out,
        format!(
            "{:<8} {:>14} {:>14} {:>9} {:>9} {:>10} {:>8} {:>7} {}",
            "option", "premium", "reported", "coverage", "reported", "signed", "carriers", "skipped", ""
        ),
    );
    push_line(&mut out, rule(&[8, 14, 14, 9, 9, 10, 8, 7]));

    let cheapest = comparison.cheapest().map(|o| o.option_id.as_str());
    let best = comparison.best_covered().map(|o| o.option_id.as_str());

    for o in &comparison.options {
        let t = &o.report.totals;
        let mut marks = Vec::new();
        if cheapest == Some(o.option_id.as_str()) {
            marks.push("cheapest");
        }
        if best == Some(o.option_id.as_str()) {
            marks.push("best coverage");
        }
        push_line(
            &mut out,
            format!(
                "{:<8} {:>14} {:>14} {:>9} {:>9} {:>10} {:>8} {:>7} {}",
                truncate(&o.option_id, 8),
                fmt_money(t.total_premium),
                o.reported_premium.map(fmt_money).unwrap_or_else(|| "-".to_string()),
                fmt_pct(t.weighted_coverage.as_percent()),
                o.reported_coverage
                    .map(|c| fmt_pct(c * 100.0))
                    .unwrap_or_else(|| "-".to_string()),
                fmt_capacity(t.total_capacity),
                t.carriers_used,
                o.rows_skipped,
                marks.join(", "),
            ),
        );
    }

    if !comparison.options.is_empty() {
        out.push_str("\nUse `--option <id>` for the full breakdown of one option.\n");
    }
    out
}

/// Format the ranked `scores` output.
pub fn format_scores(ingest: &IngestedScores) -> String {
    let mut out = String::new();

    out.push_str("=== placement - Coverage Scores ===\n");
    out.push_str(&format!(
        "Rows: read={} used={} skipped={}\n",
        ingest.rows_read,
        ingest.rows_used,
        ingest.row_errors.len()
    ));
    if let Some(note) = &ingest.scale_note {
        out.push_str(&format!("Note: {note}\n"));
    }
    out.push('\n');

    push_line(
        &mut out,
        format!("{:>4} {:<24} {:<20} {:<12} {:>9}", "#", "carrier", "layer", "quote", "coverage"),
    );
    push_line(&mut out, rule(&[4, 24, 20, 12, 9]));

    for (i, s) in ingest.scores.iter().enumerate() {
        push_line(
            &mut out,
            format!(
                "{:>4} {:<24} {:<20} {:<12} {:>9}",
                i + 1,
                truncate(&s.carrier, 24),
                truncate(&s.layer, 20),
                truncate(s.quote_id.as_deref().unwrap_or(""), 12),
                fmt_pct(s.coverage_score.as_percent()),
            ),
        );
    }

    if !ingest.row_errors.is_empty() {
        out.push('\n');
        out.push_str(&format_row_errors(&ingest.row_errors));
    }

    out
}

pub fn format_row_errors(errors: &[RowError]) -> String {
    let mut out = String::from("Skipped rows:\n");
    for e in errors {
        out.push_str(&format!(
            "  #{:<4} {:<20} {}\n",
            e.index,
            truncate(e.carrier.as_deref().unwrap_or("-"), 20),
            e.message
        ));
    }
    out
}

fn push_line(out: &mut String, line: String) {
    out.push_str(line.trim_end());
    out.push('\n');
}

fn rule(widths: &[usize]) -> String {
    widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join(" ")
}

fn fmt_layers(layers: &[LayerId]) -> String {
    layers
        .iter()
        .map(|l| l.label())
        .collect::<Vec<_>>()
        .join(",")
}

/// Capacities are carried in millions.
fn fmt_capacity(v: f64) -> String {
    format!("${v:.2}M")
}

fn fmt_money(v: f64) -> String {
    let whole = format!("{:.0}", v.abs());
    let mut grouped = String::new();
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if v < 0.0 && whole != "0" { "-" } else { "" };
    format!("{sign}${grouped}")
}

fn fmt_pct(v: f64) -> String {
    format!("{v:.1}%")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
