//! Domain entities

mod conversation_history;
mod conversation_message;

pub use conversation_history::{ConversationHistory, DEFAULT_MAX_TURNS};
pub use conversation_message::{ConversationMessage, MessageRole};
