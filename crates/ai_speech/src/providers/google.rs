//! Google Cloud speech adapters
//!
//! Recognition posts base64 LINEAR16 audio to `speech:recognize`, synthesis
//! posts text to `text:synthesize` and receives base64 MP3. Both send the
//! API key as the `key` query parameter.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use infrastructure::http::build_client;
use infrastructure::{RetryPolicy, with_retry};

use super::{checked_body, parse_json};
use crate::audio::inspect_wav;
use crate::config::{SttConfig, TtsConfig};
use crate::error::SpeechError;
use crate::ports::{SpeechSynthesizer, SpeechToText};
use crate::types::{AudioData, AudioFormat, Recognition, Transcription};

const STT_NAME: &str = "google-stt";
const TTS_NAME: &str = "google-tts";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognizeRequest {
    config: RecognitionConfig,
    audio: RecognitionAudio,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig {
    encoding: &'static str,
    sample_rate_hertz: u32,
    audio_channel_count: u16,
    language_code: String,
    enable_word_time_offsets: bool,
}

#[derive(Debug, Serialize)]
struct RecognitionAudio {
    content: String,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<Alternative>,
    #[serde(default, rename = "languageCode")]
    language_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    #[serde(default)]
    transcript: String,
    confidence: Option<f32>,
}

impl RecognizeResponse {
    /// Join the best alternative of every result
    ///
    /// Long utterances come back as consecutive results.
    fn into_recognition(self, fallback_language: &str) -> Result<Recognition, SpeechError> {
        let Some(first) = self.results.first() else {
            return Ok(Recognition::from_transcription(Transcription::new("")));
        };
        let language = first
            .language_code
            .clone()
            .unwrap_or_else(|| fallback_language.to_string());

        let mut confidence = None;
        let mut parts = Vec::with_capacity(self.results.len());
        for result in self.results {
            let best = result.alternatives.into_iter().next().ok_or_else(|| {
                SpeechError::InvalidResponse(format!("{STT_NAME} result without alternatives"))
            })?;
            confidence = confidence.or(best.confidence);
            let text = best.transcript.trim().to_string();
            if !text.is_empty() {
                parts.push(text);
            }
        }

        let mut transcription = Transcription::new(parts.join(" ")).with_language(language);
        if let Some(c) = confidence {
            transcription = transcription.with_confidence(c);
        }
        Ok(Recognition::from_transcription(transcription))
    }
}

/// Google Cloud Speech-to-Text
#[derive(Debug)]
pub struct GoogleSpeechToText {
    client: Client,
    config: SttConfig,
    policy: RetryPolicy,
}

impl GoogleSpeechToText {
    /// Validate the configuration and build the client
    pub fn new(config: SttConfig) -> Result<Self, SpeechError> {
        config.validate().map_err(SpeechError::Configuration)?;
        let client = build_client(config.timeout_ms)
            .map_err(|e| SpeechError::Configuration(e.to_string()))?;
        let policy = config.retry_policy();

        info!(
            provider = STT_NAME,
            language = %config.language_code,
            "Initialized speech recognition"
        );
        Ok(Self {
            client,
            config,
            policy,
        })
    }

    async fn recognize_once(&self, body: &RecognizeRequest) -> Result<Recognition, SpeechError> {
        let response = self
            .client
            .post(self.config.resolved_endpoint())
            .query(&[("key", self.config.api_key().unwrap_or_default())])
            .json(body)
            .send()
            .await?;
        let body = checked_body(response, STT_NAME).await?;
        parse_json::<RecognizeResponse>(STT_NAME, &body)?
            .into_recognition(&self.config.language_code)
    }
}

#[async_trait]
impl SpeechToText for GoogleSpeechToText {
    #[instrument(skip(self, wav), fields(provider = STT_NAME, bytes = wav.size_bytes()))]
    async fn transcribe(&self, wav: AudioData) -> Result<Recognition, SpeechError> {
        let info = inspect_wav(wav.data())?;
        let body = RecognizeRequest {
            config: RecognitionConfig {
                encoding: "LINEAR16",
                sample_rate_hertz: info.sample_rate,
                audio_channel_count: info.channels,
                language_code: self.config.language_code.clone(),
                enable_word_time_offsets: false,
            },
            audio: RecognitionAudio {
                content: BASE64.encode(wav.data()),
            },
        };

        let outcome = with_retry(&self.policy, || self.recognize_once(&body)).await;
        debug!(attempts = outcome.attempts, "Recognition finished");
        outcome.into_result()
    }

    fn provider_name(&self) -> &'static str {
        STT_NAME
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: SynthesisAudioConfig,
}

#[derive(Debug, Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesisAudioConfig {
    audio_encoding: &'static str,
    speaking_rate: f32,
    pitch: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    #[serde(default)]
    audio_content: String,
}

/// Google Cloud Text-to-Speech
#[derive(Debug)]
pub struct GoogleSynthesizer {
    client: Client,
    config: TtsConfig,
    policy: RetryPolicy,
}

impl GoogleSynthesizer {
    /// Validate the configuration and build the client
    pub fn new(config: TtsConfig) -> Result<Self, SpeechError> {
        config.validate().map_err(SpeechError::Configuration)?;
        let client = build_client(config.timeout_ms)
            .map_err(|e| SpeechError::Configuration(e.to_string()))?;
        let policy = config.retry_policy();

        info!(
            provider = TTS_NAME,
            voice = ?config.resolved_voice(),
            "Initialized speech synthesis"
        );
        Ok(Self {
            client,
            config,
            policy,
        })
    }

    async fn synthesize_once(&self, body: &SynthesizeRequest<'_>) -> Result<AudioData, SpeechError> {
        let response = self
            .client
            .post(self.config.resolved_endpoint())
            .query(&[("key", self.config.api_key().unwrap_or_default())])
            .json(body)
            .send()
            .await?;
        let body = checked_body(response, TTS_NAME).await?;
        let parsed: SynthesizeResponse = parse_json(TTS_NAME, &body)?;

        if parsed.audio_content.is_empty() {
            return Err(SpeechError::InvalidResponse(format!(
                "{TTS_NAME} response carried no audioContent"
            )));
        }
        let audio = BASE64.decode(parsed.audio_content.as_bytes()).map_err(|e| {
            SpeechError::InvalidResponse(format!("{TTS_NAME} audioContent is not base64: {e}"))
        })?;
        Ok(AudioData::new(audio, AudioFormat::Mp3))
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleSynthesizer {
    #[instrument(skip(self, text), fields(provider = TTS_NAME, text_len = text.len()))]
    async fn synthesize_raw(&self, text: &str) -> Result<AudioData, SpeechError> {
        let body = SynthesizeRequest {
            input: SynthesisInput { text },
            voice: VoiceSelection {
                language_code: &self.config.language_code,
                name: self.config.resolved_voice(),
            },
            audio_config: SynthesisAudioConfig {
                audio_encoding: "MP3",
                speaking_rate: self.config.speaking_rate,
                pitch: self.config.pitch,
            },
        };

        let outcome = with_retry(&self.policy, || self.synthesize_once(&body)).await;
        debug!(attempts = outcome.attempts, "Synthesis finished");
        outcome.into_result()
    }

    fn provider_name(&self) -> &'static str {
        TTS_NAME
    }
}
