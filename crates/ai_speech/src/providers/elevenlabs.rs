//! ElevenLabs text-to-speech

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::Serialize;
use tracing::{debug, info, instrument};

use infrastructure::http::build_client;
use infrastructure::{RetryPolicy, with_retry};

use super::{audio_from_body, checked_body};
use crate::config::{TtsConfig, VoiceSettings};
use crate::error::SpeechError;
use crate::ports::SpeechSynthesizer;
use crate::types::{AudioData, AudioFormat};

const NAME: &str = "elevenlabs";

#[derive(Debug, Serialize)]
struct ElevenLabsRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

/// ElevenLabs synthesizer; posts to `{endpoint}/{voice_id}`
#[derive(Debug)]
pub struct ElevenLabsSynthesizer {
    client: Client,
    config: TtsConfig,
    policy: RetryPolicy,
    url: String,
}

impl ElevenLabsSynthesizer {
    /// Validate the configuration and build the client
    ///
    /// Fails with `SpeechError::Configuration` when no voice id is available.
    pub fn new(config: TtsConfig) -> Result<Self, SpeechError> {
        config.validate().map_err(SpeechError::Configuration)?;
        let voice = config
            .resolved_voice()
            .ok_or_else(|| SpeechError::Configuration("voice id is required".to_string()))?;
        let url = format!("{}/{}", config.resolved_endpoint(), voice);
        let client = build_client(config.timeout_ms)
            .map_err(|e| SpeechError::Configuration(e.to_string()))?;
        let policy = config.retry_policy();

        info!(provider = NAME, voice, "Initialized speech synthesis");
        Ok(Self {
            client,
            config,
            policy,
            url,
        })
    }

    async fn synthesize_once(&self, body: &ElevenLabsRequest<'_>) -> Result<AudioData, SpeechError> {
        let response = self
            .client
            .post(&self.url)
            .header("xi-api-key", self.config.api_key().unwrap_or_default())
            .header(ACCEPT, AudioFormat::Mp3.mime_type())
            .json(body)
            .send()
            .await?;
        let body = checked_body(response, NAME).await?;
        audio_from_body(NAME, body, AudioFormat::Mp3)
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSynthesizer {
    #[instrument(skip(self, text), fields(provider = NAME, text_len = text.len()))]
    async fn synthesize_raw(&self, text: &str) -> Result<AudioData, SpeechError> {
        let body = ElevenLabsRequest {
            text,
            model_id: self.config.resolved_model().unwrap_or_default(),
            voice_settings: self.config.voice_settings,
        };

        let outcome = with_retry(&self.policy, || self.synthesize_once(&body)).await;
        debug!(attempts = outcome.attempts, "Synthesis finished");
        outcome.into_result()
    }

    fn provider_name(&self) -> &'static str {
        NAME
    }
}
