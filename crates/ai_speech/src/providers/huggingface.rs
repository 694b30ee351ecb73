//! Hugging Face inference API text-to-speech
//!
//! Posts `{"inputs": text}` to `{endpoint}/{model}`; the model answers with
//! audio bytes, WAV unless the content type says otherwise.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, instrument};

use infrastructure::http::build_client;
use infrastructure::{RetryPolicy, with_retry};

use super::{audio_from_body, checked_body};
use crate::config::TtsConfig;
use crate::error::SpeechError;
use crate::ports::SpeechSynthesizer;
use crate::types::{AudioData, AudioFormat};

const NAME: &str = "huggingface";

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
}

/// Hugging Face hosted TTS model
#[derive(Debug)]
pub struct HuggingFaceSynthesizer {
    client: Client,
    config: TtsConfig,
    policy: RetryPolicy,
    url: String,
}

impl HuggingFaceSynthesizer {
    /// Validate the configuration and build the client
    pub fn new(config: TtsConfig) -> Result<Self, SpeechError> {
        config.validate().map_err(SpeechError::Configuration)?;
        let model = config
            .resolved_model()
            .ok_or_else(|| SpeechError::Configuration("model is required".to_string()))?;
        let url = format!("{}/{}", config.resolved_endpoint(), model);
        let client = build_client(config.timeout_ms)
            .map_err(|e| SpeechError::Configuration(e.to_string()))?;
        let policy = config.retry_policy();

        info!(provider = NAME, model, "Initialized speech synthesis");
        Ok(Self {
            client,
            config,
            policy,
            url,
        })
    }

    async fn synthesize_once(&self, text: &str) -> Result<AudioData, SpeechError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(self.config.api_key().unwrap_or_default())
            .json(&InferenceRequest { inputs: text })
            .send()
            .await?;
        let body = checked_body(response, NAME).await?;
        audio_from_body(NAME, body, AudioFormat::Wav)
    }
}

#[async_trait]
impl SpeechSynthesizer for HuggingFaceSynthesizer {
    #[instrument(skip(self, text), fields(provider = NAME, text_len = text.len()))]
    async fn synthesize_raw(&self, text: &str) -> Result<AudioData, SpeechError> {
        let outcome = with_retry(&self.policy, || self.synthesize_once(text)).await;
        debug!(attempts = outcome.attempts, "Synthesis finished");
        outcome.into_result()
    }

    fn provider_name(&self) -> &'static str {
        NAME
    }
}
