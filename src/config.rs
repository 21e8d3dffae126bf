//! Environment-driven configuration.
//!
//! Values come from the process environment (after loading `.env` if present);
//! command-line flags override them in `app`.

use std::env;

use clap::ValueEnum;
use thiserror::Error;

use crate::domain::ScoreScale;
use crate::error::AppError;
use crate::scores::DEFAULT_LAYER;

pub const ENV_DEFAULT_LAYER: &str = "PLACEMENT_DEFAULT_LAYER";
pub const ENV_SCORE_SCALE: &str = "PLACEMENT_SCORE_SCALE";
pub const ENV_LOG_LEVEL: &str = "PLACEMENT_LOG_LEVEL";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Layer assigned when a score record's carrier string carries none.
    pub default_layer: String,
    /// Declared scale of the scoring API's `coverage_score`.
    pub score_scale: ScoreScale,
    pub telemetry: TelemetryConfig,
}

/// Tracing controls.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("PLACEMENT_DEFAULT_LAYER must not be blank")]
    BlankDefaultLayer,
    #[error("PLACEMENT_SCORE_SCALE must be one of percent, fraction, auto (got '{value}')")]
    InvalidScoreScale { value: String },
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::new(2, err.to_string())
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup. Missing keys take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let default_layer = match lookup(ENV_DEFAULT_LAYER) {
            Some(v) if v.trim().is_empty() => return Err(ConfigError::BlankDefaultLayer),
            Some(v) => v.trim().to_string(),
            None => DEFAULT_LAYER.to_string(),
        };

        let score_scale = match lookup(ENV_SCORE_SCALE) {
            Some(v) => ScoreScale::from_str(v.trim(), true)
                .map_err(|_| ConfigError::InvalidScoreScale { value: v })?,
            None => ScoreScale::default(),
        };

        let log_level = lookup(ENV_LOG_LEVEL)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "info".to_string());

        Ok(Self {
            default_layer,
            score_scale,
            telemetry: TelemetryConfig { log_level },
        })
    }
}
