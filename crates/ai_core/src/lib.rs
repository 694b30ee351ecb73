//! AI Core - language model adapters
//!
//! A single generic driver ([`ChatModel`]) handles history, retries and HTTP
//! for every chat backend; each vendor only contributes a [`ChatDialect`].
//! Supported backends: OpenAI, Mistral, Gemini and a local Ollama server.

pub mod chat;
pub mod config;
pub mod error;
pub mod ports;
pub mod providers;

pub use chat::{ChatDialect, ChatModel};
pub use config::{InferenceConfig, LlmProvider};
pub use error::InferenceError;
pub use ports::LanguageModel;
pub use providers::{
    GeminiChatModel, MistralChatModel, OllamaChatModel, OpenAiChatModel, build_language_model,
};
