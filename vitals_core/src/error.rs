//! Error types for the vitals_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for vitals_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller supplied measurements or arguments that make no sense
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A forecast was requested for zero steps
    #[error("Invalid forecast horizon: {0} (must be at least 1)")]
    InvalidHorizon(usize),

    /// History contains NaN or an infinity
    #[error("History value at index {index} is not finite ({value})")]
    NonFiniteHistory { index: usize, value: f64 },

    /// Subject is not present in the history store
    #[error("Unknown subject: {0}")]
    UnknownSubject(String),
}
