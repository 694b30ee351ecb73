//! Google Gemini `generateContent`
//!
//! The system prompt travels in `system_instruction` instead of the message
//! list, assistant turns use the role `model`, and the key goes in the query
//! string.

use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};

use domain::{ConversationMessage, MessageRole};

use crate::chat::{ChatDialect, ChatModel};
use crate::config::InferenceConfig;
use crate::error::InferenceError;

/// Gemini request body
#[derive(Debug, Serialize)]
pub struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    top_p: f32,
    top_k: u32,
}

/// Gemini response body
#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

fn text_content(role: Option<&str>, text: &str) -> Content {
    Content {
        role: role.map(ToString::to_string),
        parts: vec![Part {
            text: text.to_string(),
        }],
    }
}

/// Dialect for `POST /v1beta/models/{model}:generateContent`
#[derive(Debug, Clone, Copy, Default)]
pub struct GeminiDialect;

impl ChatDialect for GeminiDialect {
    type Request = GenerateContentRequest;
    type Response = GenerateContentResponse;

    fn name(&self) -> &'static str {
        "gemini"
    }

    fn endpoint(&self, config: &InferenceConfig) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            config.resolved_base_url(),
            config.resolved_model()
        )
    }

    fn authorize(&self, request: RequestBuilder, api_key: Option<&str>) -> RequestBuilder {
        match api_key {
            Some(key) => request.query(&[("key", key)]),
            None => request,
        }
    }

    fn build_request(
        &self,
        messages: &[ConversationMessage],
        config: &InferenceConfig,
    ) -> Self::Request {
        let mut system_instruction = None;
        let mut contents = Vec::with_capacity(messages.len());

        for message in messages {
            match message.role() {
                MessageRole::System => {
                    system_instruction = Some(text_content(None, message.content()));
                },
                MessageRole::User => contents.push(text_content(Some("user"), message.content())),
                MessageRole::Assistant => {
                    contents.push(text_content(Some("model"), message.content()));
                },
            }
        }

        GenerateContentRequest {
            system_instruction,
            contents,
            generation_config: GenerationConfig {
                temperature: config.temperature,
                max_output_tokens: config.max_tokens,
                top_p: config.top_p,
                top_k: config.top_k,
            },
        }
    }

    fn extract_reply(&self, response: Self::Response) -> Option<String> {
        response
            .candidates
            .into_iter()
            .next()?
            .content
            .parts
            .into_iter()
            .next()
            .map(|part| part.text)
    }
}

/// Gemini chat model
pub type GeminiChatModel = ChatModel<GeminiDialect>;

impl GeminiChatModel {
    /// Create a Gemini chat model
    pub fn gemini(config: InferenceConfig) -> Result<Self, InferenceError> {
        Self::new(config, GeminiDialect)
    }
}
