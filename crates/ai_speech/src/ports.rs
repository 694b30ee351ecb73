//! Port definitions for speech processing
//!
//! Defines the traits (ports) that speech adapters implement: the capture
//! device, recognition, raw synthesis and playback-ready synthesis.

use std::sync::Arc;

use async_trait::async_trait;

use domain::SpeechSample;

use crate::error::SpeechError;
use crate::types::{AudioData, DecodedAudio, Recognition};

/// Port for microphones and other sample sources
///
/// Implementations must reject `start` with `SpeechError::DeviceBusy` while
/// a capture is already running, leaving that capture intact.
pub trait CaptureDevice: Send + Sync {
    /// Begin buffering samples from `device`, or the default input
    fn start(&self, device: Option<&str>) -> Result<(), SpeechError>;

    /// Stop buffering and hand over everything captured since `start`
    fn stop(&self) -> Result<SpeechSample, SpeechError>;

    /// Whether a capture is running
    fn is_capturing(&self) -> bool;
}

/// Port for Speech-to-Text (STT) implementations
///
/// # Example
///
/// ```ignore
/// use ai_speech::{AudioData, AudioFormat, Recognition, SpeechToText};
///
/// async fn transcribe(stt: &dyn SpeechToText, wav: Vec<u8>) -> Option<String> {
///     match stt.transcribe(AudioData::new(wav, AudioFormat::Wav)).await.ok()? {
///         Recognition::Transcript(t) => Some(t.text),
///         Recognition::NoSpeech(_) => None,
///     }
/// }
/// ```
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe a 16-bit PCM WAV
    ///
    /// An empty transcript is reported as `Recognition::NoSpeech`, not as
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns `SpeechError` if the audio is unreadable or the service fails
    /// after retries.
    async fn transcribe(&self, wav: AudioData) -> Result<Recognition, SpeechError>;

    /// Short name used in logs
    fn provider_name(&self) -> &'static str;
}

/// Port for vendor synthesis returning encoded audio
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` into the vendor's audio format
    ///
    /// # Errors
    ///
    /// Returns `SpeechError` if the service fails after retries or answers
    /// with something that is not audio.
    async fn synthesize_raw(&self, text: &str) -> Result<AudioData, SpeechError>;

    /// Short name used in logs
    fn provider_name(&self) -> &'static str;
}

/// Port for Text-to-Speech (TTS) yielding playback-ready PCM
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Synthesize and decode `text`
    ///
    /// # Errors
    ///
    /// `SpeechError::Validation` for blank text, otherwise whatever
    /// synthesis or decoding reports.
    async fn synthesize(&self, text: &str) -> Result<Arc<DecodedAudio>, SpeechError>;

    /// Drop any cached audio
    fn clear_cache(&self) {}
}
