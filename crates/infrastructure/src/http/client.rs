//! Shared HTTP client construction and vendor response classification

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;

/// Maximum number of characters of a raw body quoted in parse errors
pub const SNIPPET_MAX_CHARS: usize = 200;

/// How a non-success HTTP status should be treated by the retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 2xx
    Success,
    /// 5xx, 429 or 408 - another attempt may succeed
    Transient,
    /// Any other status - the vendor rejected the request
    Rejected,
}

/// Upper bound on establishing a connection
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build a client whose timeout applies to each individual attempt
///
/// The connect timeout never exceeds the request timeout.
pub fn build_client(timeout_ms: u64) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_millis(timeout_ms);
    Client::builder()
        .connect_timeout(timeout.min(CONNECT_TIMEOUT))
        .timeout(timeout)
        .user_agent(concat!("voxchain/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Classify an HTTP status
#[must_use]
pub fn classify_status(status: StatusCode) -> StatusClass {
    if status.is_success() {
        StatusClass::Success
    } else if status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
    {
        StatusClass::Transient
    } else {
        StatusClass::Rejected
    }
}

/// Extract the human-readable message from a vendor error body
///
/// Understands `{"error": {"message": ".."}}` (OpenAI, Mistral, Google),
/// `{"error": ".."}` (HuggingFace) and `{"detail": {"message": ".."}}`
/// (ElevenLabs). Falls back to the canonical status text.
#[must_use]
pub fn vendor_error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| extract_message(&json))
        .unwrap_or_else(|| status_text(status))
}

fn extract_message(json: &Value) -> Option<String> {
    let candidates = [
        json.pointer("/error/message"),
        json.get("error"),
        json.pointer("/detail/message"),
        json.get("detail"),
        json.get("message"),
    ];

    candidates
        .into_iter()
        .flatten()
        .find_map(Value::as_str)
        .filter(|message| !message.trim().is_empty())
        .map(ToString::to_string)
}

/// Canonical reason phrase for a status, or its numeric code
#[must_use]
pub fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map_or_else(|| status.as_u16().to_string(), ToString::to_string)
}

/// Bounded prefix of a raw body for error messages
#[must_use]
pub fn snippet(body: &str) -> String {
    let mut chars = body.chars();
    let head: String = chars.by_ref().take(SNIPPET_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_client_succeeds() {
        assert!(build_client(5_000).is_ok());
    }

    #[test]
    fn build_client_accepts_timeouts_around_connect_bound() {
        assert!(build_client(1).is_ok());
        assert!(build_client(120_000).is_ok());
    }

    #[test]
    fn success_statuses() {
        assert_eq!(classify_status(StatusCode::OK), StatusClass::Success);
        assert_eq!(classify_status(StatusCode::CREATED), StatusClass::Success);
    }

    #[test]
    fn transient_statuses() {
        for status in [
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::BAD_GATEWAY,
            StatusCode::SERVICE_UNAVAILABLE,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::REQUEST_TIMEOUT,
        ] {
            assert_eq!(
                classify_status(status),
                StatusClass::Transient,
                "{status} should be retryable"
            );
        }
    }

    #[test]
    fn rejected_statuses() {
        for status in [
            StatusCode::BAD_REQUEST,
            StatusCode::UNAUTHORIZED,
            StatusCode::FORBIDDEN,
            StatusCode::NOT_FOUND,
            StatusCode::UNPROCESSABLE_ENTITY,
        ] {
            assert_eq!(classify_status(status), StatusClass::Rejected);
        }
    }

    #[test]
    fn openai_style_error_message() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        assert_eq!(
            vendor_error_message(StatusCode::UNAUTHORIZED, body),
            "Incorrect API key provided"
        );
    }

    #[test]
    fn google_style_error_message() {
        let body = r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(
            vendor_error_message(StatusCode::BAD_REQUEST, body),
            "API key not valid"
        );
    }

    #[test]
    fn flat_error_string() {
        let body = r#"{"error":"Model is loading"}"#;
        assert_eq!(
            vendor_error_message(StatusCode::SERVICE_UNAVAILABLE, body),
            "Model is loading"
        );
    }

    #[test]
    fn elevenlabs_detail_message() {
        let body = r#"{"detail":{"status":"invalid_api_key","message":"Invalid API key"}}"#;
        assert_eq!(
            vendor_error_message(StatusCode::UNAUTHORIZED, body),
            "Invalid API key"
        );
    }

    #[test]
    fn non_json_body_falls_back_to_status_text() {
        assert_eq!(
            vendor_error_message(StatusCode::FORBIDDEN, "<html>nope</html>"),
            "Forbidden"
        );
    }

    #[test]
    fn empty_message_falls_back_to_status_text() {
        let body = r#"{"error":{"message":""}}"#;
        assert_eq!(vendor_error_message(StatusCode::NOT_FOUND, body), "Not Found");
    }

    #[test]
    fn snippet_bounds_long_bodies() {
        let body = "x".repeat(SNIPPET_MAX_CHARS + 50);
        let s = snippet(&body);
        assert_eq!(s.chars().count(), SNIPPET_MAX_CHARS + 3);
        assert!(s.ends_with("..."));
    }

    #[test]
    fn snippet_keeps_short_bodies() {
        assert_eq!(snippet("short"), "short");
    }

    #[test]
    fn snippet_respects_char_boundaries() {
        let body = "語".repeat(SNIPPET_MAX_CHARS + 1);
        assert!(snippet(&body).starts_with('語'));
    }
}
