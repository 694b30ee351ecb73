//! Orchestrator configuration

use serde::{Deserialize, Serialize};

use domain::{ConversationHistory, DEFAULT_MAX_TURNS, DomainError};

/// Configuration for the interaction pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Initial system prompt of the conversation
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Number of user/assistant exchanges kept in the history
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,

    /// Synthesize replies to audio; text-only when false
    #[serde(default = "default_synthesize_replies")]
    pub synthesize_replies: bool,
}

fn default_system_prompt() -> String {
    "You are a friendly voice assistant. Keep your answers short and conversational.".to_string()
}

const fn default_max_turns() -> usize {
    DEFAULT_MAX_TURNS
}

const fn default_synthesize_replies() -> bool {
    true
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            max_turns: default_max_turns(),
            synthesize_replies: default_synthesize_replies(),
        }
    }
}

impl PipelineConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_turns == 0 {
            return Err("max_turns must be greater than 0".to_string());
        }
        if self.system_prompt.trim().is_empty() {
            return Err("system_prompt must not be empty".to_string());
        }
        Ok(())
    }

    /// Fresh history seeded with the system prompt
    pub fn new_history(&self) -> Result<ConversationHistory, DomainError> {
        ConversationHistory::new(self.system_prompt.clone(), self.max_turns)
    }
}
