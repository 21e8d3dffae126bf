//! Export command results to JSON.
//!
//! Every export shares one envelope: the producing tool, a UTC timestamp, the
//! command name, and the command's payload. Timestamps live only here; engine
//! outputs never carry them.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const EXPORT_TOOL: &str = "placement";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportFile<T> {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub command: String,
    pub payload: T,
}

impl<T> ExportFile<T> {
    pub fn new(command: &str, payload: T) -> Self {
        Self {
            tool: EXPORT_TOOL.to_string(),
            generated_at: Utc::now(),
            command: command.to_string(),
            payload,
        }
    }
}

/// Write `payload` to `path` wrapped in an `ExportFile` envelope.
pub fn write_export_json<T: Serialize>(path: &Path, command: &str, payload: &T) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create export JSON '{}': {e}", path.display())))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &ExportFile::new(command, payload))
        .map_err(|e| AppError::new(4, format!("Failed to write export JSON: {e}")))?;
    writer
        .flush()
        .map_err(|e| AppError::new(4, format!("Failed to flush export JSON '{}': {e}", path.display())))
}

/// Read an export back, keeping the payload untyped.
pub fn read_export_json(path: &Path) -> Result<ExportFile<serde_json::Value>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open export JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid export JSON: {e}")))
}
