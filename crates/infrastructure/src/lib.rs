//! Infrastructure layer - shared plumbing for the provider adapters
//!
//! Retrying request execution, HTTP client helpers, the bounded response
//! cache and logging initialisation.

pub mod cache;
pub mod http;
pub mod retry;
pub mod telemetry;

pub use cache::{CacheStats, ResponseCache};
pub use http::{StatusClass, build_client, classify_status, vendor_error_message};
pub use retry::{RetryPolicy, RetryResult, Retryable, retry, with_retry};
pub use telemetry::{LogFormat, TelemetryConfig, TelemetryError, init_tracing};
