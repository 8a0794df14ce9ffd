//! Telemetry error types.

use thiserror::Error;

/// Errors raised while installing the logging pipeline.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The log configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A global subscriber could not be installed.
    #[error("Initialization error: {0}")]
    InitError(String),

    /// The log directory could not be prepared.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
