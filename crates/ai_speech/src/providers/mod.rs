//! Speech provider implementations
//!
//! Concrete [`SpeechToText`] and [`SpeechSynthesizer`] adapters plus the
//! factories that pick one from configuration.

pub mod elevenlabs;
pub mod google;
pub mod huggingface;
pub mod openai;

use std::sync::Arc;

use bytes::Bytes;
use reqwest::Response;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use tracing::warn;

use infrastructure::http::snippet;

pub use elevenlabs::ElevenLabsSynthesizer;
pub use google::{GoogleSpeechToText, GoogleSynthesizer};
pub use huggingface::HuggingFaceSynthesizer;
pub use openai::{OpenAiSynthesizer, WhisperSpeechToText};

use crate::audio::SymphoniaDecoder;
use crate::cached::CachedTextToSpeech;
use crate::config::{SttConfig, SttProvider, TtsConfig, TtsProvider};
use crate::error::SpeechError;
use crate::ports::{SpeechSynthesizer, SpeechToText, TextToSpeech};
use crate::types::{AudioData, AudioFormat};

/// Build the recogniser selected by `config.provider`
pub fn build_speech_to_text(config: &SttConfig) -> Result<Arc<dyn SpeechToText>, SpeechError> {
    Ok(match config.provider {
        SttProvider::Google => Arc::new(GoogleSpeechToText::new(config.clone())?),
        SttProvider::OpenAi => Arc::new(WhisperSpeechToText::new(config.clone())?),
    })
}

/// Build the raw synthesizer selected by `config.provider`
pub fn build_synthesizer(config: &TtsConfig) -> Result<Arc<dyn SpeechSynthesizer>, SpeechError> {
    Ok(match config.provider {
        TtsProvider::Google => Arc::new(GoogleSynthesizer::new(config.clone())?),
        TtsProvider::OpenAi => Arc::new(OpenAiSynthesizer::new(config.clone())?),
        TtsProvider::ElevenLabs => Arc::new(ElevenLabsSynthesizer::new(config.clone())?),
        TtsProvider::HuggingFace => Arc::new(HuggingFaceSynthesizer::new(config.clone())?),
    })
}

/// Build a decoding, caching [`TextToSpeech`] around the configured synthesizer
pub fn build_text_to_speech(config: &TtsConfig) -> Result<Arc<dyn TextToSpeech>, SpeechError> {
    let synthesizer = build_synthesizer(config)?;
    Ok(Arc::new(CachedTextToSpeech::new(
        synthesizer,
        Arc::new(SymphoniaDecoder::new()),
        config,
    )))
}

/// Successful response body with its declared content type
pub(crate) struct ResponseBody {
    pub(crate) bytes: Bytes,
    pub(crate) content_type: Option<String>,
}

/// Read the body, mapping non-success statuses to errors
pub(crate) async fn checked_body(
    response: Response,
    provider: &'static str,
) -> Result<ResponseBody, SpeechError> {
    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = response.bytes().await?;

    if !status.is_success() {
        let text = String::from_utf8_lossy(&bytes);
        warn!(
            provider,
            status = %status,
            body = %snippet(&text),
            "Speech request failed"
        );
        return Err(SpeechError::from_status(status, &text));
    }

    Ok(ResponseBody {
        bytes,
        content_type,
    })
}

/// Parse a JSON body
pub(crate) fn parse_json<T: DeserializeOwned>(
    provider: &'static str,
    body: &ResponseBody,
) -> Result<T, SpeechError> {
    serde_json::from_slice(&body.bytes).map_err(|e| {
        SpeechError::InvalidResponse(format!(
            "{provider} response could not be parsed ({e}): {}",
            snippet(&String::from_utf8_lossy(&body.bytes))
        ))
    })
}

/// Interpret a binary body as audio
///
/// The content type decides the format when it names a known one, otherwise
/// `fallback` is assumed. JSON or empty bodies are rejected.
pub(crate) fn audio_from_body(
    provider: &'static str,
    body: ResponseBody,
    fallback: AudioFormat,
) -> Result<AudioData, SpeechError> {
    let content_type = body.content_type.as_deref().unwrap_or_default();
    if content_type.starts_with("application/json") || content_type.starts_with("text/") {
        return Err(SpeechError::InvalidResponse(format!(
            "{provider} returned {content_type} instead of audio: {}",
            snippet(&String::from_utf8_lossy(&body.bytes))
        )));
    }
    if body.bytes.is_empty() {
        return Err(SpeechError::InvalidResponse(format!(
            "{provider} returned an empty audio body"
        )));
    }

    let format = AudioFormat::from_mime_type(content_type).unwrap_or(fallback);
    Ok(AudioData::new(body.bytes, format))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(bytes: &'static [u8], content_type: Option<&str>) -> ResponseBody {
        ResponseBody {
            bytes: Bytes::from_static(bytes),
            content_type: content_type.map(str::to_string),
        }
    }

    #[test]
    fn content_type_picks_format() {
        let audio = audio_from_body("t", body(b"abc", Some("audio/wav")), AudioFormat::Mp3).unwrap();
        assert_eq!(audio.format(), AudioFormat::Wav);
    }

    #[test]
    fn unknown_content_type_uses_fallback() {
        let audio = audio_from_body(
            "t",
            body(b"abc", Some("application/octet-stream")),
            AudioFormat::Mp3,
        )
        .unwrap();
        assert_eq!(audio.format(), AudioFormat::Mp3);
    }

    #[test]
    fn json_body_is_not_audio() {
        let err = audio_from_body(
            "t",
            body(br#"{"error":"loading"}"#, Some("application/json")),
            AudioFormat::Wav,
        )
        .unwrap_err();
        assert!(matches!(err, SpeechError::InvalidResponse(_)));
    }

    #[test]
    fn empty_body_is_not_audio() {
        assert!(audio_from_body("t", body(b"", None), AudioFormat::Mp3).is_err());
    }

    #[test]
    fn factories_reject_missing_keys() {
        assert!(matches!(
            build_speech_to_text(&SttConfig::default()),
            Err(SpeechError::Configuration(_))
        ));
        assert!(matches!(
            build_text_to_speech(&TtsConfig::default()),
            Err(SpeechError::Configuration(_))
        ));
    }

    #[test]
    fn factories_build_every_provider() {
        for provider in [SttProvider::Google, SttProvider::OpenAi] {
            assert!(build_speech_to_text(&SttConfig::test(provider)).is_ok());
        }
        for provider in [
            TtsProvider::Google,
            TtsProvider::OpenAi,
            TtsProvider::ElevenLabs,
            TtsProvider::HuggingFace,
        ] {
            assert!(build_synthesizer(&TtsConfig::test(provider)).is_ok());
        }
    }
}
