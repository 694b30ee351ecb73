//! Speech processing errors

use reqwest::StatusCode;
use thiserror::Error;

use infrastructure::Retryable;
use infrastructure::http::{StatusClass, classify_status, vendor_error_message};

/// Errors that can occur during speech processing
#[derive(Debug, Error)]
pub enum SpeechError {
    /// Invalid configuration (missing key, voice id ...)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Unusable input (empty text, unsupported format)
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Invalid audio format or corrupted data
    #[error("Invalid audio: {0}")]
    InvalidAudio(String),

    /// The capture device is already recording
    #[error("Capture device busy: {0}")]
    DeviceBusy(String),

    /// The capture device failed or was used out of order
    #[error("Capture failed: {0}")]
    Capture(String),

    /// Failed to connect to speech service
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

    /// Invalid response from service
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Compressed audio could not be decoded
    #[error("Audio decoding failed: {0}")]
    Decode(String),
}

impl SpeechError {
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

impl Retryable for SpeechError {
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

impl From<reqwest::Error> for SpeechError {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_message() {
        let err = SpeechError::Configuration("voice_id is required".to_string());
        assert_eq!(err.to_string(), "Configuration error: voice_id is required");
    }

    #[test]
    fn device_busy_error_message() {
        let err = SpeechError::DeviceBusy("default".to_string());
        assert_eq!(err.to_string(), "Capture device busy: default");
    }

    #[test]
    fn invalid_audio_error_message() {
        let err = SpeechError::InvalidAudio("corrupt header".to_string());
        assert_eq!(err.to_string(), "Invalid audio: corrupt header");
    }

    #[test]
    fn rejected_error_message() {
        let err = SpeechError::Rejected {
            status: 403,
            message: "Forbidden".to_string(),
        };
        assert_eq!(err.to_string(), "Request rejected (403): Forbidden");
    }

    #[test]
    fn decode_error_message() {
        let err = SpeechError::Decode("no audio track".to_string());
        assert_eq!(err.to_string(), "Audio decoding failed: no audio track");
    }

    #[test]
    fn retryable_classification() {
        assert!(SpeechError::Timeout("t".into()).is_retryable());
        assert!(SpeechError::RateLimited("r".into()).is_retryable());
        assert!(
            SpeechError::ServerError {
                status: 500,
                message: "boom".into()
            }
            .is_retryable()
        );
        assert!(!SpeechError::InvalidResponse("json".into()).is_retryable());
        assert!(!SpeechError::Validation("empty".into()).is_retryable());
        assert!(!SpeechError::DeviceBusy("mic".into()).is_retryable());
    }

    #[test]
    fn from_status_uses_vendor_message() {
        let err = SpeechError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"error":{"code":400,"message":"Invalid recognition config"}}"#,
        );
        assert!(matches!(
            err,
            SpeechError::Rejected { status: 400, ref message } if message == "Invalid recognition config"
        ));
    }

    #[test]
    fn from_status_falls_back_to_status_text() {
        let err = SpeechError::from_status(StatusCode::SERVICE_UNAVAILABLE, "");
        assert!(matches!(
            err,
            SpeechError::ServerError { status: 503, ref message } if message == "Service Unavailable"
        ));
    }
}
