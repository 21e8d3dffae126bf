//! Error types.
//!
//! Two layers:
//!
//! - `EngineError`: raised by the pure engine components, only for
//!   configuration-level misuse (bad importance level, negative capacity, ...)
//! - `AppError`: what the binary reports, carrying a process exit code

use thiserror::Error;

/// Failure raised by the engine components.
///
/// Degenerate-but-valid inputs (empty quote lists, zero capacity, strings that
/// match no carrier/layer pattern) never produce an `EngineError`; they resolve
/// to documented fallback values instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid argument `{field}`: {message}")]
    InvalidArgument { field: &'static str, message: String },
}

impl EngineError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field,
            message: message.into(),
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        AppError::new(2, err.to_string())
    }
}
