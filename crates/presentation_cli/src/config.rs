//! Application configuration
//!
//! Read from an optional TOML file, then overridden by `VOXCHAIN__`-prefixed
//! environment variables with `__` between path segments, e.g.
//! `VOXCHAIN__INFERENCE__API_KEY` or `VOXCHAIN__SPEECH__TTS__PROVIDER`.

use std::path::Path;

use ai_core::InferenceConfig;
use ai_speech::SpeechConfig;
use application::PipelineConfig;
use infrastructure::TelemetryConfig;
use serde::{Deserialize, Serialize};

/// File looked up in the working directory when no path is given
const DEFAULT_CONFIG_NAME: &str = "voxchain";

const ENV_PREFIX: &str = "VOXCHAIN";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Logging
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Language model
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Recognition and synthesis
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Conversation and pipeline behaviour
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl AppConfig {
    /// Load configuration from an optional file and the environment
    ///
    /// With `path` the file must exist; without it `voxchain.toml` in the
    /// working directory is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self, ::config::ConfigError> {
        let file = match path {
            Some(path) => ::config::File::from(path).required(true),
            None => ::config::File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        let builder = ::config::Config::builder().add_source(file).add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Validate the sections every command needs
    ///
    /// Speech sections are validated when their providers are built, so a
    /// text-only session does not need speech credentials.
    pub fn validate(&self) -> Result<(), String> {
        self.telemetry
            .validate()
            .map_err(|e| format!("telemetry: {e}"))?;
        self.inference
            .validate()
            .map_err(|e| format!("inference: {e}"))?;
        self.pipeline
            .validate()
            .map_err(|e| format!("pipeline: {e}"))?;
        Ok(())
    }

    /// Default configuration rendered as TOML
    pub fn template() -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(&Self::default())
    }
}
