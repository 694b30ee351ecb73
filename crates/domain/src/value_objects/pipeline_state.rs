//! Pipeline state value object
//!
//! The stage an interaction orchestrator is currently in.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage of a capture → STT → LLM → TTS traversal
///
/// The cycle is `Idle → Capturing → Transcribing → Generating → Synthesizing
/// → Idle`. A typed utterance enters at `Generating`. Any failure returns
/// directly to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    /// No traversal in flight
    #[default]
    Idle,
    /// Microphone capture in progress
    Capturing,
    /// Waiting for speech-to-text
    Transcribing,
    /// Waiting for the language model
    Generating,
    /// Waiting for text-to-speech
    Synthesizing,
}

impl PipelineState {
    /// Check if a traversal is in flight
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    /// Successor on the happy path
    #[must_use]
    pub const fn next(&self) -> Self {
        match self {
            Self::Idle => Self::Capturing,
            Self::Capturing => Self::Transcribing,
            Self::Transcribing => Self::Generating,
            Self::Generating => Self::Synthesizing,
            Self::Synthesizing => Self::Idle,
        }
    }

    /// Human-readable label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Capturing => "capturing",
            Self::Transcribing => "transcribing",
            Self::Generating => "generating",
            Self::Synthesizing => "synthesizing",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
