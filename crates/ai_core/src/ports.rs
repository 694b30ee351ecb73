//! Port definitions for language models
//!
//! Defines the trait every chat backend adapter implements.

use async_trait::async_trait;
use domain::ConversationHistory;

use crate::error::InferenceError;

/// A chat backend that continues a conversation
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Continue the conversation with a user message
    ///
    /// Appends the user turn to `history`, sends the whole history to the
    /// backend, appends the reply as an assistant turn (which trims the
    /// history) and returns the reply text.
    ///
    /// On failure the user turn stays in `history`; nothing else changes.
    async fn converse(
        &self,
        history: &mut ConversationHistory,
        user_text: &str,
    ) -> Result<String, InferenceError>;

    /// Model name sent to the backend
    fn model_name(&self) -> &str;
}
