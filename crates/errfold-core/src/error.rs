//! Error types for errfold-core.

use thiserror::Error;

/// Result type for errfold operations
pub type Result<T> = std::result::Result<T, ErrfoldError>;

/// Errors raised at the edges of the detector.
///
/// Scanning itself never fails: text that does not contain the guard idiom
/// simply yields no blocks.
#[derive(Debug, Error)]
pub enum ErrfoldError {
    /// Configuration file could not be parsed
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Header pattern could not be compiled from the configured fragments
    #[error("Failed to build guard header pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Debounced scans need a Tokio runtime to own their timers
    #[error("No Tokio runtime available to schedule a debounced scan")]
    NoRuntime,
}
