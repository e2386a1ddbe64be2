//! Error types for the risk and forecasting engine
//!
//! Only structurally malformed input is an error. Degenerate business values
//! (zero NAV, zero commitment, empty history) degrade to neutral results.

use thiserror::Error;

/// Errors raised to the caller of the engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("Invalid quarter label: {0} (expected \"Qn YYYY\")")]
    InvalidQuarter(String),

    #[error("Timeline mismatch: {0}")]
    TimelineMismatch(String),

    #[error("Matrix operation failed: {0}")]
    MatrixError(String),

    /// A blocking report task panicked or was cancelled
    #[error("Report task failed: {0}")]
    TaskFailed(String),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
