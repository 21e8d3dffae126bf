//! Sublimit importance levels and the weight vector sent with score requests.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::EngineError;

/// Operator-assigned importance of a sublimit (0 = not important .. 4 = critical).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "u8")]
pub struct ImportanceLevel(u8);

impl ImportanceLevel {
    pub const NEUTRAL: ImportanceLevel = ImportanceLevel(2);
    pub const CRITICAL: ImportanceLevel = ImportanceLevel(4);

    pub fn value(self) -> u8 {
        self.0
    }

    /// `0.01` for level 0, otherwise `level * 0.06 + 0.02` (range 0.01..=0.26).
    pub fn weight(self) -> f64 {
        if self.0 == 0 {
            0.01
        } else {
            f64::from(self.0) * 0.06 + 0.02
        }
    }
}

impl Default for ImportanceLevel {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl TryFrom<i64> for ImportanceLevel {
    type Error = EngineError;

    fn try_from(level: i64) -> Result<Self, Self::Error> {
        match u8::try_from(level) {
            Ok(l) if l <= Self::CRITICAL.0 => Ok(Self(l)),
            _ => Err(EngineError::invalid(
                "importance_level",
                format!("{level} is outside 0..=4"),
            )),
        }
    }
}

impl From<ImportanceLevel> for u8 {
    fn from(level: ImportanceLevel) -> Self {
        level.0
    }
}

/// One configured sublimit with its derived weight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SublimitWeight {
    pub sublimit_id: String,
    pub importance_level: ImportanceLevel,
    pub weight: f64,
}

impl SublimitWeight {
    pub fn new(sublimit_id: impl Into<String>, importance_level: ImportanceLevel) -> Self {
        Self {
            sublimit_id: sublimit_id.into(),
            importance_level,
            weight: importance_level.weight(),
        }
    }
}

/// Body of the coverage-score request: `{ "weights": { id: weight } }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightRequest {
    pub weights: BTreeMap<String, f64>,
}

/// Resolve importance levels for every sublimit.
///
/// Ids without an override get `NEUTRAL`. Overrides for ids outside
/// `sublimit_ids` are kept. Any override outside 0..=4 fails the whole call.
pub fn resolve_levels(
    sublimit_ids: &[String],
    overrides: &BTreeMap<String, i64>,
) -> Result<Vec<SublimitWeight>, EngineError> {
    let mut levels: BTreeMap<&str, ImportanceLevel> = sublimit_ids
        .iter()
        .map(|id| (id.as_str(), ImportanceLevel::NEUTRAL))
        .collect();

    for (id, raw) in overrides {
        levels.insert(id.as_str(), ImportanceLevel::try_from(*raw)?);
    }

    Ok(levels
        .into_iter()
        .map(|(id, level)| SublimitWeight::new(id, level))
        .collect())
}

pub fn build_weights(
    sublimit_ids: &[String],
    overrides: &BTreeMap<String, i64>,
) -> Result<WeightRequest, EngineError> {
    let weights = resolve_levels(sublimit_ids, overrides)?
        .into_iter()
        .map(|s| (s.sublimit_id, s.weight))
        .collect();
    Ok(WeightRequest { weights })
}

/// Every sublimit back at `NEUTRAL`.
pub fn reset_weights(sublimit_ids: &[String]) -> WeightRequest {
    let weights = sublimit_ids
        .iter()
        .map(|id| (id.clone(), ImportanceLevel::NEUTRAL.weight()))
        .collect();
    WeightRequest { weights }
}
