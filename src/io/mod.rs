//! Input/output helpers.
//!
//! - optimizer/scoring JSON ingest + validation (`ingest`)
//! - JSON exports (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
