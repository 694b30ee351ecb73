//! HTTP utilities shared by the provider adapters
//!
//! Client construction with a per-attempt timeout, status classification for
//! the retry loop and vendor error message extraction.

mod client;

pub use client::{
    SNIPPET_MAX_CHARS, StatusClass, build_client, classify_status, snippet, status_text,
    vendor_error_message,
};
