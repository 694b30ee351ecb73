//! Configuration for speech recognition and synthesis

use serde::{Deserialize, Serialize};

use infrastructure::RetryPolicy;

use crate::audio::vad::DEFAULT_VOLUME_THRESHOLD;

/// Speech-to-text backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SttProvider {
    /// Google Cloud Speech `speech:recognize`
    #[default]
    Google,
    /// OpenAI Whisper transcriptions
    #[serde(rename = "openai")]
    OpenAi,
}

impl SttProvider {
    /// Endpoint used when none is configured
    #[must_use]
    pub const fn default_endpoint(self) -> &'static str {
        match self {
            Self::Google => "https://speech.googleapis.com/v1/speech:recognize",
            Self::OpenAi => "https://api.openai.com/v1/audio/transcriptions",
        }
    }

    /// Lowercase name used in config files and logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::OpenAi => "openai",
        }
    }
}

impl std::fmt::Display for SttProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text-to-speech backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TtsProvider {
    /// Google Cloud Text-to-Speech `text:synthesize`
    #[default]
    Google,
    /// OpenAI audio speech
    #[serde(rename = "openai")]
    OpenAi,
    /// ElevenLabs text-to-speech
    ElevenLabs,
    /// Hugging Face inference API
    HuggingFace,
}

impl TtsProvider {
    /// Endpoint used when none is configured
    ///
    /// ElevenLabs appends the voice id, Hugging Face the model id.
    #[must_use]
    pub const fn default_endpoint(self) -> &'static str {
        match self {
            Self::Google => "https://texttospeech.googleapis.com/v1/text:synthesize",
            Self::OpenAi => "https://api.openai.com/v1/audio/speech",
            Self::ElevenLabs => "https://api.elevenlabs.io/v1/text-to-speech",
            Self::HuggingFace => "https://api-inference.huggingface.co/models",
        }
    }

    /// Model used when none is configured, if the backend takes one
    #[must_use]
    pub const fn default_model(self) -> Option<&'static str> {
        match self {
            Self::Google => None,
            Self::OpenAi => Some("gpt-4o-mini-tts"),
            Self::ElevenLabs => Some("eleven_flash_v2_5"),
            Self::HuggingFace => Some("espnet/kan-bayashi_ljspeech_vits"),
        }
    }

    /// Voice used when none is configured
    #[must_use]
    pub const fn default_voice(self) -> Option<&'static str> {
        match self {
            Self::Google => Some("en-US-Standard-C"),
            Self::OpenAi => Some("alloy"),
            Self::ElevenLabs => Some("JBFqnCBsd6RMkjVDRZzb"),
            Self::HuggingFace => None,
        }
    }

    /// Lowercase name used in config files and logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::OpenAi => "openai",
            Self::ElevenLabs => "elevenlabs",
            Self::HuggingFace => "huggingface",
        }
    }
}

impl std::fmt::Display for TtsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Speech-to-text configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct SttConfig {
    /// Which backend transcribes
    #[serde(default)]
    pub provider: SttProvider,

    /// API key for the backend
    #[serde(default)]
    pub api_key: Option<String>,

    /// Override of the backend's endpoint
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Whisper model name
    #[serde(default = "default_stt_model")]
    pub model: String,

    /// BCP-47 language code; Whisper receives the primary subtag
    #[serde(default = "default_language_code")]
    pub language_code: String,

    /// Whisper sampling temperature
    #[serde(default)]
    pub temperature: f32,

    /// Input device name, `None` for the system default
    #[serde(default)]
    pub device: Option<String>,

    /// Absolute amplitude a sample must exceed to count as voiced
    #[serde(default = "default_volume_threshold")]
    pub volume_threshold: f32,

    /// Wait after the stop request so the final buffer is flushed
    #[serde(default = "default_flush_delay_ms")]
    pub flush_delay_ms: u64,

    /// Per-attempt request timeout in milliseconds
    #[serde(default = "default_stt_timeout_ms")]
    pub timeout_ms: u64,

    /// Total attempts per request, including the first
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the second attempt in milliseconds
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

fn default_stt_model() -> String {
    "whisper-1".to_string()
}

fn default_language_code() -> String {
    "en-US".to_string()
}

const fn default_volume_threshold() -> f32 {
    DEFAULT_VOLUME_THRESHOLD
}

const fn default_flush_delay_ms() -> u64 {
    500
}

const fn default_stt_timeout_ms() -> u64 {
    30_000
}

const fn default_tts_timeout_ms() -> u64 {
    10_000
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_retry_base_delay_ms() -> u64 {
    1000
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            provider: SttProvider::default(),
            api_key: None,
            endpoint: None,
            model: default_stt_model(),
            language_code: default_language_code(),
            temperature: 0.0,
            device: None,
            volume_threshold: default_volume_threshold(),
            flush_delay_ms: default_flush_delay_ms(),
            timeout_ms: default_stt_timeout_ms(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

impl std::fmt::Debug for SttConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SttConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("language_code", &self.language_code)
            .field("volume_threshold", &self.volume_threshold)
            .field("flush_delay_ms", &self.flush_delay_ms)
            .field("timeout_ms", &self.timeout_ms)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl SttConfig {
    /// Config for a given provider with every other field defaulted
    #[must_use]
    pub fn for_provider(provider: SttProvider) -> Self {
        Self {
            provider,
            ..Default::default()
        }
    }

    /// Endpoint without trailing slash
    #[must_use]
    pub fn resolved_endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.provider.default_endpoint())
            .trim_end_matches('/')
    }

    /// Primary language subtag, `"en"` for `"en-US"`
    #[must_use]
    pub fn primary_language(&self) -> &str {
        self.language_code
            .split(['-', '_'])
            .next()
            .unwrap_or(&self.language_code)
    }

    /// API key if present and non-blank
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    /// Retry policy derived from `max_retries` and `retry_base_delay_ms`
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.retry_base_delay_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.api_key().is_none() {
            return Err(format!("stt api_key is required for {}", self.provider));
        }
        if self.language_code.trim().is_empty() {
            return Err("language_code must not be empty".to_string());
        }
        if !(0.0..1.0).contains(&self.volume_threshold) {
            return Err(format!(
                "volume_threshold must be in [0.0, 1.0), got {}",
                self.volume_threshold
            ));
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(format!(
                "stt temperature must be between 0.0 and 1.0, got {}",
                self.temperature
            ));
        }
        if self.timeout_ms == 0 {
            return Err("stt timeout_ms must be greater than 0".to_string());
        }
        if self.max_retries == 0 {
            return Err("stt max_retries must be at least 1".to_string());
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn test(provider: SttProvider) -> Self {
        Self {
            provider,
            api_key: Some("test-key".to_string()),
            ..Default::default()
        }
    }
}

/// Voice tuning sent to ElevenLabs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    /// Consistency between generations (0.0 - 1.0)
    #[serde(default = "default_half")]
    pub stability: f32,
    /// Adherence to the original voice (0.0 - 1.0)
    #[serde(default = "default_half")]
    pub similarity_boost: f32,
    /// Style exaggeration (0.0 - 1.0)
    #[serde(default)]
    pub style: f32,
    /// Boost similarity to the original speaker
    #[serde(default = "default_true")]
    pub use_speaker_boost: bool,
}

const fn default_half() -> f32 {
    0.5
}

const fn default_true() -> bool {
    true
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: default_half(),
            similarity_boost: default_half(),
            style: 0.0,
            use_speaker_boost: true,
        }
    }
}

/// Text-to-speech configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    /// Which backend synthesizes
    #[serde(default)]
    pub provider: TtsProvider,

    /// API key for the backend
    #[serde(default)]
    pub api_key: Option<String>,

    /// Override of the backend's endpoint
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Override of the backend's default model
    #[serde(default)]
    pub model: Option<String>,

    /// Override of the backend's default voice
    #[serde(default)]
    pub voice: Option<String>,

    /// Google voice language
    #[serde(default = "default_language_code")]
    pub language_code: String,

    /// Speaking rate (0.25 - 4.0)
    #[serde(default = "default_speaking_rate")]
    pub speaking_rate: f32,

    /// Google pitch in semitones (-20.0 - 20.0)
    #[serde(default)]
    pub pitch: f32,

    /// ElevenLabs voice settings
    #[serde(default)]
    pub voice_settings: VoiceSettings,

    /// Per-attempt request timeout in milliseconds
    #[serde(default = "default_tts_timeout_ms")]
    pub timeout_ms: u64,

    /// Total attempts per request, including the first
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the second attempt in milliseconds
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Cache decoded audio by text
    #[serde(default = "default_true")]
    pub enable_cache: bool,

    /// Maximum cached entries
    #[serde(default = "default_max_cache_size")]
    pub max_cache_size: usize,
}

const fn default_speaking_rate() -> f32 {
    1.0
}

const fn default_max_cache_size() -> usize {
    50
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            provider: TtsProvider::default(),
            api_key: None,
            endpoint: None,
            model: None,
            voice: None,
            language_code: default_language_code(),
            speaking_rate: default_speaking_rate(),
            pitch: 0.0,
            voice_settings: VoiceSettings::default(),
            timeout_ms: default_tts_timeout_ms(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            enable_cache: true,
            max_cache_size: default_max_cache_size(),
        }
    }
}

impl std::fmt::Debug for TtsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtsConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("voice", &self.voice)
            .field("speaking_rate", &self.speaking_rate)
            .field("enable_cache", &self.enable_cache)
            .field("max_cache_size", &self.max_cache_size)
            .finish_non_exhaustive()
    }
}

impl TtsConfig {
    /// Config for a given provider with every other field defaulted
    #[must_use]
    pub fn for_provider(provider: TtsProvider) -> Self {
        Self {
            provider,
            ..Default::default()
        }
    }

    /// Endpoint without trailing slash
    #[must_use]
    pub fn resolved_endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.provider.default_endpoint())
            .trim_end_matches('/')
    }

    /// Model name to send, if any
    #[must_use]
    pub fn resolved_model(&self) -> Option<&str> {
        self.model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .or_else(|| self.provider.default_model())
    }

    /// Voice to request, if any
    #[must_use]
    pub fn resolved_voice(&self) -> Option<&str> {
        self.voice
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.provider.default_voice())
    }

    /// API key if present and non-blank
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    /// Retry policy derived from `max_retries` and `retry_base_delay_ms`
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.retry_base_delay_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.api_key().is_none() {
            return Err(format!("tts api_key is required for {}", self.provider));
        }
        if !(0.25..=4.0).contains(&self.speaking_rate) {
            return Err(format!(
                "speaking_rate must be between 0.25 and 4.0, got {}",
                self.speaking_rate
            ));
        }
        if !(-20.0..=20.0).contains(&self.pitch) {
            return Err(format!("pitch must be between -20.0 and 20.0, got {}", self.pitch));
        }
        let settings = &self.voice_settings;
        for (name, value) in [
            ("stability", settings.stability),
            ("similarity_boost", settings.similarity_boost),
            ("style", settings.style),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{name} must be between 0.0 and 1.0, got {value}"));
            }
        }
        if self.provider == TtsProvider::ElevenLabs && self.resolved_voice().is_none() {
            return Err("voice is required for elevenlabs".to_string());
        }
        if self.provider == TtsProvider::HuggingFace && self.resolved_model().is_none() {
            return Err("model is required for huggingface".to_string());
        }
        if self.timeout_ms == 0 {
            return Err("tts timeout_ms must be greater than 0".to_string());
        }
        if self.max_retries == 0 {
            return Err("tts max_retries must be at least 1".to_string());
        }
        if self.enable_cache && self.max_cache_size == 0 {
            return Err("max_cache_size must be greater than 0 when caching".to_string());
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn test(provider: TtsProvider) -> Self {
        Self {
            provider,
            api_key: Some("test-key".to_string()),
            ..Default::default()
        }
    }
}

/// Both halves of the speech stack
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Recognition settings
    #[serde(default)]
    pub stt: SttConfig,
    /// Synthesis settings
    #[serde(default)]
    pub tts: TtsConfig,
}

impl SpeechConfig {
    /// Validate both halves
    pub fn validate(&self) -> Result<(), String> {
        self.stt.validate()?;
        self.tts.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stt_defaults() {
        let config = SttConfig::default();
        assert_eq!(config.provider, SttProvider::Google);
        assert_eq!(config.model, "whisper-1");
        assert_eq!(config.flush_delay_ms, 500);
        assert!((config.volume_threshold - 0.001).abs() < f32::EPSILON);
        assert_eq!(
            config.resolved_endpoint(),
            "https://speech.googleapis.com/v1/speech:recognize"
        );
    }

    #[test]
    fn primary_language_strips_region() {
        let config = SttConfig {
            language_code: "zh-TW".to_string(),
            ..Default::default()
        };
        assert_eq!(config.primary_language(), "zh");
        let bare = SttConfig {
            language_code: "de".to_string(),
            ..Default::default()
        };
        assert_eq!(bare.primary_language(), "de");
    }

    #[test]
    fn stt_requires_api_key() {
        let err = SttConfig::default().validate().unwrap_err();
        assert!(err.contains("api_key"));
        assert!(SttConfig::test(SttProvider::OpenAi).validate().is_ok());
    }

    #[test]
    fn stt_rejects_out_of_range_threshold() {
        let config = SttConfig {
            volume_threshold: 1.5,
            ..SttConfig::test(SttProvider::Google)
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn tts_defaults() {
        let config = TtsConfig::default();
        assert_eq!(config.provider, TtsProvider::Google);
        assert_eq!(config.timeout_ms, 10_000);
        assert_eq!(config.max_cache_size, 50);
        assert!(config.enable_cache);
        assert_eq!(config.resolved_voice(), Some("en-US-Standard-C"));
        assert_eq!(config.resolved_model(), None);
    }

    #[test]
    fn tts_provider_defaults() {
        let openai = TtsConfig::for_provider(TtsProvider::OpenAi);
        assert_eq!(openai.resolved_model(), Some("gpt-4o-mini-tts"));
        assert_eq!(openai.resolved_voice(), Some("alloy"));

        let eleven = TtsConfig::for_provider(TtsProvider::ElevenLabs);
        assert_eq!(eleven.resolved_voice(), Some("JBFqnCBsd6RMkjVDRZzb"));
        assert_eq!(eleven.resolved_model(), Some("eleven_flash_v2_5"));
    }

    #[test]
    fn blank_voice_falls_back_to_default() {
        let config = TtsConfig {
            voice: Some("  ".to_string()),
            ..TtsConfig::test(TtsProvider::OpenAi)
        };
        assert_eq!(config.resolved_voice(), Some("alloy"));
    }

    #[test]
    fn tts_rejects_speaking_rate_out_of_range() {
        let config = TtsConfig {
            speaking_rate: 5.0,
            ..TtsConfig::test(TtsProvider::OpenAi)
        };
        assert!(config.validate().unwrap_err().contains("speaking_rate"));
    }

    #[test]
    fn tts_rejects_bad_voice_settings() {
        let config = TtsConfig {
            voice_settings: VoiceSettings {
                stability: 1.5,
                ..Default::default()
            },
            ..TtsConfig::test(TtsProvider::ElevenLabs)
        };
        assert!(config.validate().unwrap_err().contains("stability"));
    }

    #[test]
    fn tts_rejects_zero_cache_size_when_enabled() {
        let config = TtsConfig {
            max_cache_size: 0,
            ..TtsConfig::test(TtsProvider::Google)
        };
        assert!(config.validate().is_err());

        let disabled = TtsConfig {
            enable_cache: false,
            max_cache_size: 0,
            ..TtsConfig::test(TtsProvider::Google)
        };
        assert!(disabled.validate().is_ok());
    }

    #[test]
    fn debug_redacts_api_keys() {
        let stt = format!("{:?}", SttConfig::test(SttProvider::Google));
        let tts = format!("{:?}", TtsConfig::test(TtsProvider::Google));
        assert!(!stt.contains("test-key"));
        assert!(!tts.contains("test-key"));
    }

    #[test]
    fn speech_config_deserializes_with_defaults() {
        let config: SpeechConfig = serde_json::from_str(
            r#"{"stt":{"provider":"openai","api_key":"a"},"tts":{"provider":"elevenlabs","api_key":"b"}}"#,
        )
        .unwrap();
        assert_eq!(config.stt.provider, SttProvider::OpenAi);
        assert_eq!(config.tts.provider, TtsProvider::ElevenLabs);
        assert!(config.validate().is_ok());
    }
}
