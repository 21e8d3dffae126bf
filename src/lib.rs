//! `placement-engine` library crate.
//!
//! The engine turns raw optimizer and scoring-API records into consistent
//! placement statistics. The binary (`placement`) is a thin wrapper so that:
//!
//! - core logic is testable without spawning processes
//! - the engine modules stay free of I/O and global state
//!
//! Engine: `rating`, `scores` (with `scores::decompose`), `weights`,
//! `allocation`, `report`. Shell: `io`, `config`, `telemetry`, `cli`, `app`.

pub mod allocation;
pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod io;
pub mod rating;
pub mod report;
pub mod scores;
pub mod telemetry;
pub mod weights;
