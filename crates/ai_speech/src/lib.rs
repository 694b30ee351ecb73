//! AI Speech - capture, recognition and synthesis
//!
//! Provides the speech halves of the voice pipeline:
//! - [`CaptureSession`] - microphone to recognised text, gated on voice energy
//! - [`SpeechToText`] - recognise a WAV (Google, OpenAI Whisper)
//! - [`SpeechSynthesizer`] - text to vendor audio (Google, OpenAI, ElevenLabs,
//!   Hugging Face)
//! - [`TextToSpeech`] - text to playback-ready PCM with a bounded cache
//!
//! # Architecture
//!
//! This crate follows the ports & adapters pattern:
//! - `ports` module defines the traits (ports)
//! - `providers` module contains the vendor adapters
//! - `audio` holds the local WAV codec, voice gate and decoder
//!
//! # Example
//!
//! ```ignore
//! use ai_speech::{build_speech_to_text, build_text_to_speech, CaptureSession, SpeechConfig};
//!
//! let stt = build_speech_to_text(&config.stt)?;
//! let tts = build_text_to_speech(&config.tts)?;
//! let session = CaptureSession::new(device, stt, &config.stt);
//!
//! session.start_capture()?;
//! let recognition = session.stop_capture().await?;
//! if let Some(text) = recognition.text() {
//!     let audio = tts.synthesize(text).await?;
//! }
//! ```

pub mod audio;
pub mod cached;
pub mod capture;
pub mod config;
pub mod error;
pub mod ports;
pub mod providers;
pub mod types;

pub use audio::{AudioDecoder, EnergyGate, SymphoniaDecoder};
pub use cached::CachedTextToSpeech;
pub use capture::{CaptureSession, ReplayCaptureDevice};
pub use config::{SpeechConfig, SttConfig, SttProvider, TtsConfig, TtsProvider, VoiceSettings};
pub use error::SpeechError;
pub use ports::{CaptureDevice, SpeechSynthesizer, SpeechToText, TextToSpeech};
pub use providers::{build_speech_to_text, build_synthesizer, build_text_to_speech};
pub use types::{
    AudioData, AudioFormat, DecodedAudio, NoSpeechReason, Recognition, Transcription,
};
