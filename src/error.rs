//! Error types for ShakeIt core

use thiserror::Error;

use crate::schema::ValidationError;

/// Errors that can occur while configuring or driving the detector
#[derive(Debug, Error)]
pub enum ShakeError {
    #[error("Accelerometer is not available on this device")]
    SensorUnavailable,

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Invalid sensor record: {0}")]
    Validation(#[from] ValidationError),
}
