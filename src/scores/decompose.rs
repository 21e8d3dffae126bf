//! Carrier/layer decomposition for scoring API records.
//!
//! The scoring API sometimes returns the carrier and layer folded into one
//! string. When no explicit layer is supplied, the heuristics below are tried
//! in this fixed order and the first one that yields a non-empty carrier and
//! layer wins:
//!
//! 1. `"<carrier> - <layer>"` (split on the first `" - "`)
//! 2. `"<carrier> (<layer>)"`
//! 3. `"<carrier> Layer <n>"` (case-insensitive)
//! 4. no match: carrier unchanged, layer = configured default
//!
//! The order is the precedence: `"Chubb (Layer 2)"` resolves through rule 2.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::{LayerField, ResolvedScore, ScoreRecord};

pub const DEFAULT_LAYER: &str = "Primary";

static PARENTHESIZED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)\s*\((.*?)\)").expect("static pattern"));

static LAYER_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)layer \d+").expect("static pattern"));

/// A clean carrier/layer pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierLayer {
    pub carrier: String,
    pub layer: String,
}

impl CarrierLayer {
    fn new(carrier: &str, layer: &str) -> Self {
        Self {
            carrier: carrier.to_string(),
            layer: layer.to_string(),
        }
    }
}

/// Resolves carrier/layer pairs; holds only the configured fallback layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decomposer {
    default_layer: String,
}

impl Default for Decomposer {
    fn default() -> Self {
        Self::new(DEFAULT_LAYER)
    }
}

impl Decomposer {
    /// A blank default is replaced by `DEFAULT_LAYER` so the layer is never empty.
    pub fn new(default_layer: impl Into<String>) -> Self {
        let default_layer = default_layer.into();
        let default_layer = if default_layer.trim().is_empty() {
            DEFAULT_LAYER.to_string()
        } else {
            default_layer
        };
        Self { default_layer }
    }

    pub fn default_layer(&self) -> &str {
        &self.default_layer
    }

    /// Split `raw_carrier` unless an explicit layer is present. Never fails.
    pub fn decompose(&self, raw_carrier: &str, explicit_layer: Option<&LayerField>) -> CarrierLayer {
        match explicit_layer {
            Some(LayerField::Number(n)) => CarrierLayer::new(raw_carrier, &numbered_layer(*n)),
            Some(LayerField::Text(text)) if !text.trim().is_empty() => {
                CarrierLayer::new(raw_carrier, text)
            }
            _ => split_combined(raw_carrier)
                .unwrap_or_else(|| CarrierLayer::new(raw_carrier, &self.default_layer)),
        }
    }

    pub fn resolve(&self, record: &ScoreRecord) -> ResolvedScore {
        let CarrierLayer { carrier, layer } =
            self.decompose(&record.raw_carrier_field, record.explicit_layer_field.as_ref());
        ResolvedScore {
            carrier,
            layer,
            quote_id: record.quote_id.clone(),
            coverage_score: record.coverage_score,
        }
    }
}

fn split_combined(raw: &str) -> Option<CarrierLayer> {
    if let Some((carrier, layer)) = raw.split_once(" - ") {
        if let Some(pair) = non_empty_pair(carrier, layer) {
            return Some(pair);
        }
    }

    if raw.contains('(') && raw.contains(')') {
        if let Some(caps) = PARENTHESIZED.captures(raw) {
            let carrier = caps.get(1).map_or("", |m| m.as_str());
            let layer = caps.get(2).map_or("", |m| m.as_str());
            if let Some(pair) = non_empty_pair(carrier, layer) {
                return Some(pair);
            }
        }
    }

    if let Some(found) = LAYER_NUMBER.find(raw) {
        if let Some(pair) = non_empty_pair(&raw[..found.start()], found.as_str()) {
            return Some(pair);
        }
    }

    None
}

fn non_empty_pair(carrier: &str, layer: &str) -> Option<CarrierLayer> {
    let carrier = carrier.trim();
    let layer = layer.trim();
    if carrier.is_empty() || layer.is_empty() {
        return None;
    }
    Some(CarrierLayer::new(carrier, layer))
}

fn numbered_layer(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("Layer {}", n as i64)
    } else {
        format!("Layer {n}")
    }
}
