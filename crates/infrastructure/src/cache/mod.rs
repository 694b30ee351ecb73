//! Cache implementations
//!
//! `ResponseCache` sits in front of text-to-speech calls and keeps decoded
//! audio keyed by the synthesized text.

mod response_cache;

pub use response_cache::{CacheStats, ResponseCache};
