//! Logging initialisation

mod subscriber;

pub use subscriber::{LogFormat, TelemetryConfig, TelemetryError, init_tracing};
