//! Error types for plan diagnostics

use thiserror::Error;

/// Errors reported by the fallible diagnostic entry points
#[derive(Debug, Error)]
pub enum DiagnosticsError {
    #[error("Empty plan: no plan lines to analyze")]
    EmptyPlan,

    #[error("Invalid function name in allow-list: {0:?}")]
    InvalidFunctionName(String),

    #[error("Invalid threshold {name}: {value}")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for plan diagnostics
pub type Result<T> = std::result::Result<T, DiagnosticsError>;
