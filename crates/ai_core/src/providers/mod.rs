//! Chat backend adapters

mod gemini;
mod mistral;
mod ollama;
mod openai;

pub use gemini::{GeminiChatModel, GeminiDialect, GenerateContentRequest, GenerateContentResponse};
pub use mistral::{MistralChatModel, MistralDialect, MistralRequest};
pub use ollama::{GenerateRequest, GenerateResponse, OllamaChatModel, OllamaDialect, render_inst_prompt};
pub use openai::{
    Choice, ChoiceMessage, CompletionRequest, CompletionResponse, OpenAiChatModel, OpenAiDialect,
    WireMessage,
};

use crate::config::{InferenceConfig, LlmProvider};
use crate::error::InferenceError;
use crate::ports::LanguageModel;

/// Build the configured language model
pub fn build_language_model(
    config: InferenceConfig,
) -> Result<Box<dyn LanguageModel>, InferenceError> {
    Ok(match config.provider {
        LlmProvider::OpenAi => Box::new(OpenAiChatModel::openai(config)?),
        LlmProvider::Mistral => Box::new(MistralChatModel::mistral(config)?),
        LlmProvider::Gemini => Box::new(GeminiChatModel::gemini(config)?),
        LlmProvider::Ollama => Box::new(OllamaChatModel::ollama(config)?),
    })
}
