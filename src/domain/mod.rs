//! Domain types used throughout the engine.
//!
//! This module defines:
//!
//! - layer identity and coverage scale (`LayerId`, `CoverageScore`, `ScoreScale`)
//! - ingested records (`QuoteRecord`, `ScoreRecord`, `ResolvedScore`)
//! - aggregation outputs (`LayerSummary`, `CarrierSummary`, `PlacementTotals`, etc.)

pub mod types;

pub use types::*;
