//! Domain-level errors

use thiserror::Error;

/// Errors that can occur in the domain layer
#[derive(Debug, Error)]
pub enum DomainError {
    /// Validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),

    /// Captured audio is malformed
    #[error("Invalid speech sample: {0}")]
    InvalidSpeechSample(String),

    /// History capacity out of range
    #[error("Invalid history capacity: {0}")]
    InvalidCapacity(String),
}
