//! Local Ollama `/api/generate`
//!
//! Ollama's generate endpoint takes a single prompt string, so the history is
//! rendered in the Llama `[INST]` chat template.

use serde::{Deserialize, Serialize};

use domain::{ConversationMessage, MessageRole};

use crate::chat::{ChatDialect, ChatModel};
use crate::config::InferenceConfig;
use crate::error::InferenceError;

/// Ollama generate request
#[derive(Debug, Serialize)]
pub struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
    top_p: f32,
    top_k: u32,
}

/// Ollama generate response
#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

/// Render a conversation in the `[INST]` template, one line per message
#[must_use]
pub fn render_inst_prompt(messages: &[ConversationMessage]) -> String {
    let mut prompt = String::new();

    for message in messages {
        let content = message.content();
        match message.role() {
            MessageRole::System => {
                prompt.push_str(&format!("<s>[INST] <<SYS>>\n{content}\n<</SYS>>\n\n"));
            },
            MessageRole::User if prompt.is_empty() => {
                prompt.push_str(&format!("<s>[INST] {content} [/INST]"));
            },
            MessageRole::User => prompt.push_str(&format!("[INST] {content} [/INST]")),
            MessageRole::Assistant => prompt.push_str(&format!("{content}</s>")),
        }
        prompt.push('\n');
    }

    prompt
}

/// Dialect for `POST /api/generate`
#[derive(Debug, Clone, Copy, Default)]
pub struct OllamaDialect;

impl ChatDialect for OllamaDialect {
    type Request = GenerateRequest;
    type Response = GenerateResponse;

    fn name(&self) -> &'static str {
        "ollama"
    }

    fn endpoint(&self, config: &InferenceConfig) -> String {
        format!("{}/api/generate", config.resolved_base_url())
    }

    fn build_request(
        &self,
        messages: &[ConversationMessage],
        config: &InferenceConfig,
    ) -> Self::Request {
        GenerateRequest {
            model: config.resolved_model().to_string(),
            prompt: render_inst_prompt(messages),
            stream: false,
            options: GenerateOptions {
                temperature: config.temperature,
                num_predict: config.max_tokens,
                top_p: config.top_p,
                top_k: config.top_k,
            },
        }
    }

    fn extract_reply(&self, response: Self::Response) -> Option<String> {
        response.response
    }
}

/// Ollama chat model
pub type OllamaChatModel = ChatModel<OllamaDialect>;

impl OllamaChatModel {
    /// Create an Ollama chat model
    pub fn ollama(config: InferenceConfig) -> Result<Self, InferenceError> {
        Self::new(config, OllamaDialect)
    }
}
