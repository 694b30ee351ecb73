//! Inference errors

use reqwest::StatusCode;
use thiserror::Error;

use infrastructure::http::{StatusClass, classify_status, vendor_error_message};
use infrastructure::Retryable;

/// Errors that can occur while talking to a language model
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Missing or invalid configuration (e.g. no API key)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The request itself is unusable (e.g. empty message)
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Failed to connect to the backend
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// An attempt exceeded the client timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Other transport failure
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// HTTP 429
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// HTTP 5xx or 408
    #[error("Server error ({status}): {message}")]
    ServerError {
        /// HTTP status code
        status: u16,
        /// Vendor message or status text
        message: String,
    },

    /// Any other non-success status
    #[error("Request rejected ({status}): {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Vendor message or status text
        message: String,
    },

    /// Response could not be parsed or carried no reply
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl InferenceError {
    /// Map a non-success response to an error
    #[must_use]
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = vendor_error_message(status, body);
        match classify_status(status) {
            _ if status == StatusCode::TOO_MANY_REQUESTS => Self::RateLimited(message),
            StatusClass::Transient => Self::ServerError {
                status: status.as_u16(),
                message,
            },
            StatusClass::Success | StatusClass::Rejected => Self::Rejected {
                status: status.as_u16(),
                message,
            },
        }
    }
}

impl Retryable for InferenceError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_)
                | Self::Timeout(_)
                | Self::RateLimited(_)
                | Self::ServerError { .. }
        )
    }
}

impl From<reqwest::Error> for InferenceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() || err.is_request() || err.is_body() {
            // Includes connections dropped mid-request and failed body reads
            Self::ConnectionFailed(err.to_string())
        } else {
            Self::RequestFailed(err.to_string())
        }
    }
}
