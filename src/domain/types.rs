//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - built from the optimizer / scoring API payloads at the ingest boundary
//! - folded into summaries by the aggregation engine
//! - exported to JSON for the presentation layer

use std::cmp::Ordering;
use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Allocation sums may drift above 100 by this much before a quote is rejected.
pub const ALLOCATION_TOLERANCE: f64 = 1e-6;

/// A band of the placement tower.
///
/// Display order is `rank()`; the ordering impls below delegate to it so a
/// `BTreeMap<LayerId, _>` iterates bottom-up through the tower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerId {
    Primary,
    Excess1,
    Excess2,
}

impl LayerId {
    pub const ALL: [LayerId; 3] = [LayerId::Primary, LayerId::Excess1, LayerId::Excess2];

    pub fn rank(self) -> u8 {
        match self {
            LayerId::Primary => 1,
            LayerId::Excess1 => 2,
            LayerId::Excess2 => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LayerId::Primary => "Primary",
            LayerId::Excess1 => "Excess1",
            LayerId::Excess2 => "Excess2",
        }
    }

    /// Label used by the optimizer for the $10M-per-layer tower.
    pub fn tower_label(self) -> &'static str {
        match self {
            LayerId::Primary => "Primary $10M",
            LayerId::Excess1 => "$10M xs $10M",
            LayerId::Excess2 => "$10M xs $20M",
        }
    }

    /// Resolve an upstream layer label.
    ///
    /// Matching ignores case and whitespace. Accepted forms:
    /// - canonical names (`Primary`, `Excess1`, `Excess2`)
    /// - `Excess 1`, `1st Excess`, `First Excess` (and the `2` equivalents)
    /// - optimizer tower labels (`Primary $10M`, `$10M xs $10M`, `$10M xs $20M`)
    pub fn parse(raw: &str) -> Option<LayerId> {
        let key: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();

        match key.as_str() {
            "primary" | "primary$10m" => Some(LayerId::Primary),
            "excess1" | "1stexcess" | "firstexcess" | "$10mxs$10m" => Some(LayerId::Excess1),
            "excess2" | "2ndexcess" | "secondexcess" | "$10mxs$20m" => Some(LayerId::Excess2),
            _ => None,
        }
    }
}

impl Ord for LayerId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for LayerId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw credit-rating field as it arrives from upstream: a numeric code or a label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RatingRaw {
    Code(f64),
    Label(String),
}

/// Coverage quality metric, stored on the internal 0-100 scale.
///
/// The optimizer reports coverage as a fraction (0-1) while the scoring API
/// reports a percentage (0-100). Conversion happens once, at ingest, through
/// `from_fraction` / `from_percent`; nothing downstream sees the raw scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoverageScore(f64);

impl CoverageScore {
    pub const ZERO: CoverageScore = CoverageScore(0.0);

    pub fn from_percent(value: f64) -> Self {
        Self(value)
    }

    pub fn from_fraction(value: f64) -> Self {
        Self(value * 100.0)
    }

    pub fn as_percent(self) -> f64 {
        self.0
    }

    pub fn as_fraction(self) -> f64 {
        self.0 / 100.0
    }

    pub fn is_in_range(self) -> bool {
        self.0.is_finite() && (0.0..=100.0).contains(&self.0)
    }
}

/// Declared scale of the scoring API's `coverage_score` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScoreScale {
    /// Infer from the batch.
    ///
    /// Heuristic (deterministic): if the largest finite score is `<= 1.0`, the
    /// batch is read as fractions, otherwise as percentages.
    Auto,
    /// Values are already 0-100.
    #[default]
    Percent,
    /// Values are 0-1 and are multiplied by 100.
    Fraction,
}

/// One carrier's offer for one layer, as seen after ingest.
///
/// `signed_capacity` / `signed_premium` are derived on demand from the
/// allocation percentage; values reported upstream are never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteRecord {
    pub carrier: String,
    pub layer: LayerId,
    pub premium: f64,
    pub capacity: f64,
    pub credit_rating: Option<RatingRaw>,
    pub coverage_score: CoverageScore,
    pub allocation_percentage: f64,
    pub quote_id: Option<String>,
}

impl QuoteRecord {
    /// Build a validated quote with no rating or quote id attached.
    pub fn new(
        carrier: impl Into<String>,
        layer: LayerId,
        premium: f64,
        capacity: f64,
        allocation_percentage: f64,
        coverage_score: CoverageScore,
    ) -> Result<Self, EngineError> {
        let quote = Self {
            carrier: carrier.into(),
            layer,
            premium,
            capacity,
            credit_rating: None,
            coverage_score,
            allocation_percentage,
            quote_id: None,
        };
        quote.validate()?;
        Ok(quote)
    }

    pub fn with_rating(mut self, rating: RatingRaw) -> Self {
        self.credit_rating = Some(rating);
        self
    }

    pub fn with_quote_id(mut self, quote_id: impl Into<String>) -> Self {
        self.quote_id = Some(quote_id.into());
        self
    }

    /// Check the record-level invariants.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.carrier.trim().is_empty() {
            return Err(EngineError::invalid("carrier", "must not be empty"));
        }
        if !self.premium.is_finite() || self.premium < 0.0 {
            return Err(EngineError::invalid(
                "premium",
                format!("{} must be finite and >= 0", self.premium),
            ));
        }
        if !self.capacity.is_finite() || self.capacity < 0.0 {
            return Err(EngineError::invalid(
                "capacity",
                format!("{} must be finite and >= 0", self.capacity),
            ));
        }
        let pct = self.allocation_percentage;
        if !pct.is_finite() || pct < 0.0 || pct > 100.0 + ALLOCATION_TOLERANCE {
            return Err(EngineError::invalid(
                "allocation_percentage",
                format!("{pct} is outside [0, 100]"),
            ));
        }
        if !self.coverage_score.is_in_range() {
            return Err(EngineError::invalid(
                "coverage_score",
                format!("{} is outside [0, 100]", self.coverage_score.as_percent()),
            ));
        }
        Ok(())
    }

    /// Quotes with a positive allocation take part in ratio statistics and membership.
    pub fn is_active(&self) -> bool {
        self.allocation_percentage > 0.0
    }

    /// Active with a positive offer, i.e. `signed_capacity() > 0`. Only these
    /// quotes share a layer's 100%.
    pub fn carries_capacity(&self) -> bool {
        self.is_active() && self.capacity > 0.0
    }

    pub fn signed_capacity(&self) -> f64 {
        self.capacity * self.allocation_percentage / 100.0
    }

    pub fn signed_premium(&self) -> f64 {
        self.premium * self.allocation_percentage / 100.0
    }
}

/// Explicit layer field on a scoring API record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LayerField {
    Number(f64),
    Text(String),
}

/// One carrier/layer coverage-score observation from the scoring API.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecord {
    pub raw_carrier_field: String,
    pub explicit_layer_field: Option<LayerField>,
    pub quote_id: Option<String>,
    pub coverage_score: CoverageScore,
}

/// A score record after carrier/layer decomposition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedScore {
    pub carrier: String,
    pub layer: String,
    pub quote_id: Option<String>,
    pub coverage_score: CoverageScore,
}

/// Per-layer aggregate over the allocation-normalized quote set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerSummary {
    pub layer: LayerId,
    pub total_capacity: f64,
    pub total_premium: f64,
    /// Capacity-weighted coverage; `0` when the layer has no signed capacity.
    pub weighted_coverage: CoverageScore,
    pub carrier_count: usize,
    /// Raw offered capacity of every quote in the layer, allocation ignored.
    pub offered_capacity: f64,
    /// No quote in the layer carries a positive allocation.
    pub degenerate: bool,
}

/// Per-carrier aggregate across all layers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarrierSummary {
    pub carrier: String,
    pub total_capacity: f64,
    pub total_premium: f64,
    pub weighted_coverage: CoverageScore,
    pub quote_count: usize,
    /// Layers this carrier is allocated in, in first-seen order.
    pub layers: Vec<LayerId>,
}

/// Active quotes grouped by canonical rating label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingBucket {
    pub rating: String,
    pub rank: u8,
    pub total_capacity: f64,
    pub total_premium: f64,
    pub quote_count: usize,
}

/// Whole-placement totals over the active, normalized quote set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacementTotals {
    pub total_premium: f64,
    pub total_capacity: f64,
    pub weighted_coverage: CoverageScore,
    pub carriers_used: usize,
    /// Largest carrier capacity over the smallest positive one.
    pub diversity_ratio: Option<f64>,
}

/// Statistics over the raw quote book, before any allocation is applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteBookStats {
    pub quote_count: usize,
    pub offered_premium: f64,
    pub offered_capacity: f64,
    /// Unweighted mean coverage; `0` on an empty book.
    pub mean_coverage: CoverageScore,
    pub distinct_carriers: usize,
    pub allocated_quotes: usize,
}
