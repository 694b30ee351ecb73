//! Configuration for the language model

use serde::{Deserialize, Serialize};

use infrastructure::RetryPolicy;

/// Supported chat backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// OpenAI chat completions
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    /// Mistral chat completions
    Mistral,
    /// Google Gemini generateContent
    Gemini,
    /// Local Ollama server
    Ollama,
}

impl LlmProvider {
    /// Base URL used when none is configured
    #[must_use]
    pub const fn default_base_url(self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com",
            Self::Mistral => "https://api.mistral.ai",
            Self::Gemini => "https://generativelanguage.googleapis.com",
            Self::Ollama => "http://localhost:11434",
        }
    }

    /// Model used when none is configured
    #[must_use]
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4",
            Self::Mistral => "mistral-small-latest",
            Self::Gemini => "gemini-2.0-flash",
            Self::Ollama => "llama3",
        }
    }

    /// Whether the backend refuses requests without an API key
    #[must_use]
    pub const fn requires_api_key(self) -> bool {
        !matches!(self, Self::Ollama)
    }

    /// Lowercase name used in config files and logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Mistral => "mistral",
            Self::Gemini => "gemini",
            Self::Ollama => "ollama",
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for the language model
#[derive(Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Which backend to talk to
    #[serde(default)]
    pub provider: LlmProvider,

    /// API key (not needed for Ollama)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Override of the backend's base URL
    #[serde(default)]
    pub base_url: Option<String>,

    /// Override of the backend's default model
    #[serde(default)]
    pub model: Option<String>,

    /// Temperature for sampling (0.0 - 2.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Top-p (nucleus) sampling
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Top-k sampling (Gemini and Ollama only)
    #[serde(default = "default_top_k")]
    pub top_k: u32,

    /// Presence penalty (OpenAI and Mistral only)
    #[serde(default)]
    pub presence_penalty: f32,

    /// Frequency penalty (OpenAI and Mistral only)
    #[serde(default)]
    pub frequency_penalty: f32,

    /// Ask Mistral to prepend its safety prompt
    #[serde(default)]
    pub safe_prompt: bool,

    /// Per-attempt request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Total attempts per request, including the first
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the second attempt in milliseconds
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

const fn default_temperature() -> f32 {
    0.7
}

const fn default_max_tokens() -> u32 {
    150
}

const fn default_top_p() -> f32 {
    1.0
}

const fn default_top_k() -> u32 {
    40
}

const fn default_timeout_ms() -> u64 {
    30_000
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_retry_base_delay_ms() -> u64 {
    1000
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            api_key: None,
            base_url: None,
            model: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
            safe_prompt: false,
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

impl std::fmt::Debug for InferenceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_ms", &self.timeout_ms)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl InferenceConfig {
    /// Config for a given provider with every other field defaulted
    #[must_use]
    pub fn for_provider(provider: LlmProvider) -> Self {
        Self {
            provider,
            ..Default::default()
        }
    }

    /// Base URL without trailing slash
    #[must_use]
    pub fn resolved_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
            .trim_end_matches('/')
    }

    /// Model name to send
    #[must_use]
    pub fn resolved_model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
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
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            ));
        }
        if self.max_tokens == 0 {
            return Err("max_tokens must be greater than 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(format!("top_p must be between 0.0 and 1.0, got {}", self.top_p));
        }
        if self.timeout_ms == 0 {
            return Err("timeout_ms must be greater than 0".to_string());
        }
        if self.max_retries == 0 {
            return Err("max_retries must be at least 1".to_string());
        }
        if self.provider.requires_api_key() && self.api_key().is_none() {
            return Err(format!("api_key is required for {}", self.provider));
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn test(provider: LlmProvider) -> Self {
        Self {
            provider,
            api_key: Some("test-key".to_string()),
            ..Default::default()
        }
    }
}
