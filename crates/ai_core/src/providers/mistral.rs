//! Mistral chat completions

use serde::Serialize;

use domain::ConversationMessage;

use super::openai::{CompletionRequest, CompletionResponse};
use crate::chat::{ChatDialect, ChatModel};
use crate::config::InferenceConfig;
use crate::error::InferenceError;

/// Mistral request: the OpenAI schema plus `safe_prompt`
#[derive(Debug, Serialize)]
pub struct MistralRequest {
    #[serde(flatten)]
    completion: CompletionRequest,
    safe_prompt: bool,
}

/// Dialect for Mistral's `POST /v1/chat/completions`
#[derive(Debug, Clone, Copy, Default)]
pub struct MistralDialect;

impl ChatDialect for MistralDialect {
    type Request = MistralRequest;
    type Response = CompletionResponse;

    fn name(&self) -> &'static str {
        "mistral"
    }

    fn endpoint(&self, config: &InferenceConfig) -> String {
        format!("{}/v1/chat/completions", config.resolved_base_url())
    }

    fn build_request(
        &self,
        messages: &[ConversationMessage],
        config: &InferenceConfig,
    ) -> Self::Request {
        MistralRequest {
            completion: CompletionRequest::from_conversation(messages, config),
            safe_prompt: config.safe_prompt,
        }
    }

    fn extract_reply(&self, response: Self::Response) -> Option<String> {
        response.into_reply()
    }
}

/// Mistral chat model
pub type MistralChatModel = ChatModel<MistralDialect>;

impl MistralChatModel {
    /// Create a Mistral chat model
    pub fn mistral(config: InferenceConfig) -> Result<Self, InferenceError> {
        Self::new(config, MistralDialect)
    }
}
