//! # Error Types
//!
//! Custom error types for RC Car Bridge using `thiserror`.

use thiserror::Error;

/// Main error type for RC Car Bridge
#[derive(Debug, Error)]
pub enum RcCarError {
    /// Motor driver rejected a command
    #[error("Motor driver error ({motor}): {reason}")]
    Motor {
        /// Which motor reported the failure ("drive" or "steering")
        motor: &'static str,
        /// Driver-supplied reason
        reason: String,
    },

    /// Controller input errors
    #[error("Controller error: {0}")]
    Controller(String),

    /// Event referenced a controller the host does not know about
    #[error("Invalid controller handle: {0}")]
    InvalidHandle(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Telemetry serialization errors
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for RC Car Bridge
pub type Result<T> = std::result::Result<T, RcCarError>;
