//! Ports the orchestrator drives besides the language model and synthesizer
//!
//! `LanguageModel` (ai_core) and `TextToSpeech` (ai_speech) are used as-is.

use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use ai_speech::{CaptureSession, DecodedAudio, Recognition, SpeechError};

use crate::error::PlaybackError;

/// Microphone side of the pipeline
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SpeechInput: Send + Sync {
    /// Start capturing; a no-op when already listening
    fn start_capture(&self) -> Result<(), SpeechError>;

    /// Stop capturing and recognise the utterance
    async fn stop_capture(&self) -> Result<Recognition, SpeechError>;

    /// Stop capturing and discard the samples
    fn cancel_capture(&self);

    /// Whether a capture is running
    fn is_listening(&self) -> bool;
}

#[async_trait]
impl SpeechInput for CaptureSession {
    fn start_capture(&self) -> Result<(), SpeechError> {
        Self::start_capture(self)
    }

    async fn stop_capture(&self) -> Result<Recognition, SpeechError> {
        Self::stop_capture(self).await
    }

    fn cancel_capture(&self) {
        Self::cancel_capture(self);
    }

    fn is_listening(&self) -> bool {
        Self::is_listening(self)
    }
}

/// Speaker side of the pipeline
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PlaybackSink: Send + Sync {
    /// Play a synthesized reply
    async fn play(&self, audio: Arc<DecodedAudio>) -> Result<(), PlaybackError>;
}
