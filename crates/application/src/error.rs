//! Pipeline errors

use ai_core::InferenceError;
use ai_speech::SpeechError;
use domain::{DomainError, PipelineState};
use thiserror::Error;

/// Failure reported by a playback collaborator
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct PlaybackError(pub String);

/// Errors surfaced by the interaction orchestrator
///
/// Every stage error leaves the orchestrator back in `Idle`.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The capture device could not be started
    #[error("Capture failed: {0}")]
    Capture(#[source] SpeechError),

    /// Stopping the capture or recognising it failed
    #[error("Transcription failed: {0}")]
    Transcription(#[source] SpeechError),

    /// The language model failed
    #[error("Generation failed: {0}")]
    Generation(#[from] InferenceError),

    /// Synthesizing or decoding the reply failed
    #[error("Synthesis failed: {0}")]
    Synthesis(#[source] SpeechError),

    /// The playback sink refused the reply audio
    #[error("Playback failed: {0}")]
    Playback(#[from] PlaybackError),

    /// Invalid pipeline configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Domain invariant violated
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl PipelineError {
    /// State the pipeline was in when the error occurred
    #[must_use]
    pub const fn failed_in(&self) -> Option<PipelineState> {
        match self {
            Self::Capture(_) => Some(PipelineState::Capturing),
            Self::Transcription(_) => Some(PipelineState::Transcribing),
            Self::Generation(_) => Some(PipelineState::Generating),
            Self::Synthesis(_) | Self::Playback(_) => Some(PipelineState::Synthesizing),
            Self::Configuration(_) | Self::Domain(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_the_stage() {
        let err = PipelineError::Transcription(SpeechError::Timeout("30s".to_string()));
        assert_eq!(
            err.to_string(),
            "Transcription failed: Request timed out: 30s"
        );

        let err = PipelineError::from(PlaybackError("device gone".to_string()));
        assert_eq!(err.to_string(), "Playback failed: device gone");
    }

    #[test]
    fn failed_in_maps_to_pipeline_state() {
        assert_eq!(
            PipelineError::Capture(SpeechError::DeviceBusy("mic".into())).failed_in(),
            Some(PipelineState::Capturing)
        );
        assert_eq!(
            PipelineError::Generation(InferenceError::Timeout("t".into())).failed_in(),
            Some(PipelineState::Generating)
        );
        assert_eq!(
            PipelineError::Synthesis(SpeechError::Decode("bad".into())).failed_in(),
            Some(PipelineState::Synthesizing)
        );
        assert_eq!(
            PipelineError::Configuration("x".into()).failed_in(),
            None
        );
    }
}
