//! Credit-rating normalization: canonical labels, display styles, and sort rank.
//!
//! All lookup tables are immutable constant slices. Palette iteration order is
//! the order written below (strongest to weakest, `N/A` last), which is what
//! makes the prefix fallback in `style_for` deterministic.

use serde::Serialize;

use crate::domain::RatingRaw;

/// Label used when a numeric code is not in `CODE_LABELS` or the field is missing.
pub const UNRATED: &str = "N/A";

/// Sort rank given to any label absent from `RANKS`.
pub const UNKNOWN_RANK: u8 = 100;

const CODE_LABELS: &[(i64, &str)] = &[
    (1, "AAA"),
    (2, "AA"),
    (3, "A"),
    (4, "BBB"),
    (5, "BB"),
    (6, "B+"),
    (7, "B"),
    (8, "B-"),
];

const RANKS: &[(&str, u8)] = &[
    ("AAA", 1),
    ("AA+", 2),
    ("AA", 3),
    ("AA-", 4),
    ("A+", 5),
    ("A", 6),
    ("A-", 7),
    ("BBB+", 8),
    ("BBB", 9),
    ("BBB-", 10),
    ("BB+", 11),
    ("BB", 12),
    ("BB-", 13),
    ("B+", 14),
    ("B", 15),
    ("B-", 16),
];

/// Background/foreground colour pair for a rating badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RatingStyle {
    pub background: &'static str,
    pub foreground: &'static str,
}

const fn style(background: &'static str, foreground: &'static str) -> RatingStyle {
    RatingStyle {
        background,
        foreground,
    }
}

pub const DEFAULT_STYLE: RatingStyle = style("#f5f5f5", "#666666");

const PALETTE: &[(&str, RatingStyle)] = &[
    ("AAA", style("#e6ffe6", "#006600")),
    ("AA+", style("#e6ffe6", "#006600")),
    ("AA", style("#ebffeb", "#007700")),
    ("AA-", style("#f0fff0", "#008800")),
    ("A+", style("#e6f9ff", "#006699")),
    ("A", style("#ebf7ff", "#0077aa")),
    ("A-", style("#f0f4ff", "#0088bb")),
    ("BBB+", style("#f2e6ff", "#5500aa")),
    ("BBB", style("#f5ebff", "#6600bb")),
    ("BBB-", style("#f7f0ff", "#7700cc")),
    ("BB+", style("#fffde6", "#886600")),
    ("BB", style("#fffae8", "#997700")),
    ("BB-", style("#fff8eb", "#aa8800")),
    ("B+", style("#fff5e6", "#aa5500")),
    ("B", style("#fff0e8", "#bb6600")),
    ("B-", style("#ffe8e6", "#cc0000")),
    (UNRATED, DEFAULT_STYLE),
];

/// Canonical label for a raw rating field.
///
/// Strings pass through unchanged (unknown labels included). Numeric codes go
/// through the 1-8 table; anything else, including a missing field or a
/// non-integral code, is `N/A`.
pub fn canonical_label(raw: Option<&RatingRaw>) -> String {
    match raw {
        Some(RatingRaw::Label(label)) => label.clone(),
        Some(RatingRaw::Code(code)) => label_for_code(*code).to_string(),
        None => UNRATED.to_string(),
    }
}

fn label_for_code(code: f64) -> &'static str {
    if !code.is_finite() || code.fract() != 0.0 {
        return UNRATED;
    }
    let code = code as i64;
    CODE_LABELS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, label)| *label)
        .unwrap_or(UNRATED)
}

/// Badge style for a canonical label.
///
/// Exact match first; otherwise the first palette entry (in table order) where
/// either label is a prefix of the other; otherwise `DEFAULT_STYLE`. An empty
/// label always gets the default style.
pub fn style_for(label: &str) -> RatingStyle {
    if label.is_empty() {
        return DEFAULT_STYLE;
    }
    if let Some((_, s)) = PALETTE.iter().find(|(key, _)| *key == label) {
        return *s;
    }
    PALETTE
        .iter()
        .find(|(key, _)| label.starts_with(key) || key.starts_with(label))
        .map(|(_, s)| *s)
        .unwrap_or(DEFAULT_STYLE)
}

/// Display rank (`AAA` = 1 .. `B-` = 16, unknown = 100).
pub fn rank(label: &str) -> u8 {
    RANKS
        .iter()
        .find(|(key, _)| *key == label)
        .map(|(_, r)| *r)
        .unwrap_or(UNKNOWN_RANK)
}

/// Stable sort by rating rank; ties keep their input order.
pub fn sort_by_rank<T>(items: &mut [T], label_of: impl Fn(&T) -> &str) {
    items.sort_by_key(|item| rank(label_of(item)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_codes_map_through_table() {
        assert_eq!(canonical_label(Some(&RatingRaw::Code(3.0))), "A");
        assert_eq!(canonical_label(Some(&RatingRaw::Code(8.0))), "B-");
        assert_eq!(canonical_label(Some(&RatingRaw::Code(99.0))), "N/A");
        assert_eq!(canonical_label(Some(&RatingRaw::Code(0.0))), "N/A");
        assert_eq!(canonical_label(Some(&RatingRaw::Code(2.5))), "N/A");
        assert_eq!(canonical_label(None), "N/A");
    }

    #[test]
    fn codes_beyond_integer_range_are_unrated() {
        for code in [1e300, -1e300, f64::MAX, f64::INFINITY, f64::NAN] {
            assert_eq!(canonical_label(Some(&RatingRaw::Code(code))), "N/A", "code {code}");
        }
    }

    #[test]
    fn strings_pass_through_unvalidated() {
        let raw = RatingRaw::Label("AA-".to_string());
        assert_eq!(canonical_label(Some(&raw)), "AA-");
        let raw = RatingRaw::Label("A++ (watch)".to_string());
        assert_eq!(canonical_label(Some(&raw)), "A++ (watch)");
    }

    #[test]
    fn style_prefers_exact_match() {
        assert_eq!(style_for("A-"), style("#f0f4ff", "#0088bb"));
        assert_eq!(style_for("N/A"), DEFAULT_STYLE);
    }

    #[test]
    fn style_prefix_fallback_is_first_in_table_order() {
        assert_eq!(style_for("AAA u"), style("#e6ffe6", "#006600"));
        // Earlier entries ("AAA", "AA", "A+") do not prefix "A (stable)"; "A" does.
        assert_eq!(style_for("A (stable)"), style("#ebf7ff", "#0077aa"));
        assert_eq!(style_for("BBx"), style("#fffae8", "#997700"));
    }

    #[test]
    fn style_falls_back_to_default() {
        assert_eq!(style_for("C"), DEFAULT_STYLE);
        assert_eq!(style_for(""), DEFAULT_STYLE);
        // "N" is a prefix of "N/A".
        assert_eq!(style_for("N"), DEFAULT_STYLE);
    }

    #[test]
    fn unknown_ratings_sort_last_with_stable_ties() {
        let mut labels = vec!["NR", "BBB", "AAA", "XYZ", "A-", "BBB"];
        sort_by_rank(&mut labels, |s| *s);
        assert_eq!(labels, vec!["AAA", "A-", "BBB", "BBB", "NR", "XYZ"]);
        assert_eq!(rank("B-"), 16);
        assert_eq!(rank("CCC"), UNKNOWN_RANK);
    }
}
