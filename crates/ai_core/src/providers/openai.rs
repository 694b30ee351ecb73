//! OpenAI chat completions
//!
//! The wire types here are shared with the Mistral dialect, which speaks the
//! same OpenAI-compatible schema.

use serde::{Deserialize, Serialize};

use domain::ConversationMessage;

use crate::chat::{ChatDialect, ChatModel};
use crate::config::InferenceConfig;
use crate::error::InferenceError;

/// OpenAI-compatible chat request
#[derive(Debug, Serialize)]
pub struct CompletionRequest {
    pub(crate) model: String,
    pub(crate) messages: Vec<WireMessage>,
    pub(crate) temperature: f32,
    pub(crate) max_tokens: u32,
    pub(crate) top_p: f32,
    pub(crate) presence_penalty: f32,
    pub(crate) frequency_penalty: f32,
}

impl CompletionRequest {
    pub(crate) fn from_conversation(
        messages: &[ConversationMessage],
        config: &InferenceConfig,
    ) -> Self {
        Self {
            model: config.resolved_model().to_string(),
            messages: messages.iter().map(WireMessage::from).collect(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            top_p: config.top_p,
            presence_penalty: config.presence_penalty,
            frequency_penalty: config.frequency_penalty,
        }
    }
}

/// Chat message on the wire
#[derive(Debug, Serialize)]
pub struct WireMessage {
    pub(crate) role: &'static str,
    pub(crate) content: String,
}

impl From<&ConversationMessage> for WireMessage {
    fn from(message: &ConversationMessage) -> Self {
        Self {
            role: message.role().as_str(),
            content: message.content().to_string(),
        }
    }
}

/// OpenAI-compatible chat response
#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub(crate) choices: Vec<Choice>,
}

/// One completion candidate
#[derive(Debug, Deserialize)]
pub struct Choice {
    pub(crate) message: ChoiceMessage,
}

/// Message of a completion candidate
#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub(crate) content: Option<String>,
}

impl CompletionResponse {
    pub(crate) fn into_reply(self) -> Option<String> {
        self.choices.into_iter().next()?.message.content
    }
}

/// Dialect for `POST /v1/chat/completions`
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiDialect;

impl ChatDialect for OpenAiDialect {
    type Request = CompletionRequest;
    type Response = CompletionResponse;

    fn name(&self) -> &'static str {
        "openai"
    }

    fn endpoint(&self, config: &InferenceConfig) -> String {
        format!("{}/v1/chat/completions", config.resolved_base_url())
    }

    fn build_request(
        &self,
        messages: &[ConversationMessage],
        config: &InferenceConfig,
    ) -> Self::Request {
        CompletionRequest::from_conversation(messages, config)
    }

    fn extract_reply(&self, response: Self::Response) -> Option<String> {
        response.into_reply()
    }
}

/// OpenAI chat model
pub type OpenAiChatModel = ChatModel<OpenAiDialect>;

impl OpenAiChatModel {
    /// Create an OpenAI chat model
    pub fn openai(config: InferenceConfig) -> Result<Self, InferenceError> {
        Self::new(config, OpenAiDialect)
    }
}
