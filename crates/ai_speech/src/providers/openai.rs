//! OpenAI speech adapters
//!
//! Whisper transcription via multipart upload, and the `audio/speech`
//! synthesis endpoint returning MP3.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use infrastructure::http::build_client;
use infrastructure::{RetryPolicy, with_retry};

use super::{audio_from_body, checked_body, parse_json};
use crate::config::{SttConfig, TtsConfig};
use crate::error::SpeechError;
use crate::ports::{SpeechSynthesizer, SpeechToText};
use crate::types::{AudioData, AudioFormat, Recognition, Transcription};

const WHISPER_NAME: &str = "openai-whisper";
const TTS_NAME: &str = "openai-tts";

/// Whisper JSON response
#[derive(Debug, Deserialize)]
struct WhisperResponse {
    text: String,
    #[serde(default)]
    language: Option<String>,
}

/// OpenAI Whisper speech-to-text
#[derive(Debug)]
pub struct WhisperSpeechToText {
    client: Client,
    config: SttConfig,
    policy: RetryPolicy,
}

impl WhisperSpeechToText {
    /// Validate the configuration and build the client
    pub fn new(config: SttConfig) -> Result<Self, SpeechError> {
        config.validate().map_err(SpeechError::Configuration)?;
        let client = build_client(config.timeout_ms)
            .map_err(|e| SpeechError::Configuration(e.to_string()))?;
        let policy = config.retry_policy();

        info!(
            provider = WHISPER_NAME,
            model = %config.model,
            language = %config.primary_language(),
            "Initialized speech recognition"
        );
        Ok(Self {
            client,
            config,
            policy,
        })
    }

    /// Multipart forms are consumed by sending, so each attempt builds its own
    fn form(&self, wav: &AudioData) -> Result<Form, SpeechError> {
        let file = Part::bytes(wav.data().to_vec())
            .file_name(wav.filename("recording"))
            .mime_str(wav.mime_type())
            .map_err(|e| SpeechError::InvalidAudio(format!("invalid MIME type: {e}")))?;

        Ok(Form::new()
            .part("file", file)
            .text("model", self.config.model.clone())
            .text("language", self.config.primary_language().to_string())
            .text("response_format", "json")
            .text("temperature", self.config.temperature.to_string()))
    }

    async fn transcribe_once(&self, wav: &AudioData) -> Result<Recognition, SpeechError> {
        let response = self
            .client
            .post(self.config.resolved_endpoint())
            .bearer_auth(self.config.api_key().unwrap_or_default())
            .multipart(self.form(wav)?)
            .send()
            .await?;
        let body = checked_body(response, WHISPER_NAME).await?;
        let parsed: WhisperResponse = parse_json(WHISPER_NAME, &body)?;

        let language = parsed
            .language
            .unwrap_or_else(|| self.config.primary_language().to_string());
        Ok(Recognition::from_transcription(
            Transcription::new(parsed.text.trim()).with_language(language),
        ))
    }
}

#[async_trait]
impl SpeechToText for WhisperSpeechToText {
    #[instrument(skip(self, wav), fields(provider = WHISPER_NAME, bytes = wav.size_bytes()))]
    async fn transcribe(&self, wav: AudioData) -> Result<Recognition, SpeechError> {
        if wav.is_empty() {
            return Err(SpeechError::InvalidAudio("audio data is empty".to_string()));
        }

        let outcome = with_retry(&self.policy, || self.transcribe_once(&wav)).await;
        debug!(attempts = outcome.attempts, "Transcription finished");
        outcome.into_result()
    }

    fn provider_name(&self) -> &'static str {
        WHISPER_NAME
    }
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    speed: f32,
    response_format: &'static str,
}

/// OpenAI text-to-speech
#[derive(Debug)]
pub struct OpenAiSynthesizer {
    client: Client,
    config: TtsConfig,
    policy: RetryPolicy,
}

impl OpenAiSynthesizer {
    /// Validate the configuration and build the client
    pub fn new(config: TtsConfig) -> Result<Self, SpeechError> {
        config.validate().map_err(SpeechError::Configuration)?;
        let client = build_client(config.timeout_ms)
            .map_err(|e| SpeechError::Configuration(e.to_string()))?;
        let policy = config.retry_policy();

        info!(
            provider = TTS_NAME,
            model = ?config.resolved_model(),
            voice = ?config.resolved_voice(),
            "Initialized speech synthesis"
        );
        Ok(Self {
            client,
            config,
            policy,
        })
    }

    async fn synthesize_once(&self, body: &SpeechRequest<'_>) -> Result<AudioData, SpeechError> {
        let response = self
            .client
            .post(self.config.resolved_endpoint())
            .bearer_auth(self.config.api_key().unwrap_or_default())
            .json(body)
            .send()
            .await?;
        let body = checked_body(response, TTS_NAME).await?;
        audio_from_body(TTS_NAME, body, AudioFormat::Mp3)
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSynthesizer {
    #[instrument(skip(self, text), fields(provider = TTS_NAME, text_len = text.len()))]
    async fn synthesize_raw(&self, text: &str) -> Result<AudioData, SpeechError> {
        let body = SpeechRequest {
            model: self.config.resolved_model().unwrap_or_default(),
            input: text,
            voice: self.config.resolved_voice().unwrap_or_default(),
            speed: self.config.speaking_rate,
            response_format: "mp3",
        };

        let outcome = with_retry(&self.policy, || self.synthesize_once(&body)).await;
        debug!(attempts = outcome.attempts, "Synthesis finished");
        outcome.into_result()
    }

    fn provider_name(&self) -> &'static str {
        TTS_NAME
    }
}
