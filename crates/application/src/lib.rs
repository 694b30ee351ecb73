//! Application layer - the interaction pipeline
//!
//! Owns the conversation and drives one exchange at a time through capture,
//! recognition, generation and synthesis. Vendors are reached only through
//! ports: [`SpeechInput`], `LanguageModel`, `TextToSpeech` and
//! [`PlaybackSink`].

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod ports;

pub use config::PipelineConfig;
pub use error::{PipelineError, PlaybackError};
pub use orchestrator::{CaptureStart, InteractionOrchestrator, Rejection, Turn, TurnOutcome};
pub use ports::{PlaybackSink, SpeechInput};
