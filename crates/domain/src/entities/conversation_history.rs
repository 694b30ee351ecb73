//! Conversation history - bounded, ordered message log with a pinned system prompt

use serde::{Deserialize, Serialize};

use super::{ConversationMessage, MessageRole};
use crate::errors::DomainError;

/// Default number of user/assistant exchanges kept in the history
pub const DEFAULT_MAX_TURNS: usize = 10;

/// Ordered conversation log sent to the language model
///
/// Index 0 always holds the current system prompt. The log is bounded to
/// `max_turns * 2 + 1` messages; [`trim`](Self::trim) drops the oldest
/// user/assistant messages but never the system prompt.
///
/// Trimming happens after every assistant append and never after a user
/// append, so a fresh user message is always part of at least one request.
/// Between a user append and the matching assistant append the log may hold
/// one message more than the capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawHistory")]
pub struct ConversationHistory {
    messages: Vec<ConversationMessage>,
    max_turns: usize,
}

/// Unchecked wire form of [`ConversationHistory`]
#[derive(Deserialize)]
struct RawHistory {
    messages: Vec<ConversationMessage>,
    max_turns: usize,
}

impl TryFrom<RawHistory> for ConversationHistory {
    type Error = DomainError;

    fn try_from(raw: RawHistory) -> Result<Self, Self::Error> {
        if raw.max_turns == 0 {
            return Err(DomainError::InvalidCapacity(
                "max_turns must be greater than 0".to_string(),
            ));
        }
        match raw.messages.first() {
            Some(first) if first.role() == MessageRole::System => {},
            _ => {
                return Err(DomainError::ValidationError(
                    "history must start with a system message".to_string(),
                ));
            },
        }
        if raw.messages[1..]
            .iter()
            .any(|m| m.role() == MessageRole::System)
        {
            return Err(DomainError::ValidationError(
                "only the first message may be a system message".to_string(),
            ));
        }
        Ok(Self {
            messages: raw.messages,
            max_turns: raw.max_turns,
        })
    }
}

impl ConversationHistory {
    /// Create a history holding only the system prompt
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidCapacity` if `max_turns` is zero.
    pub fn new(system_prompt: impl Into<String>, max_turns: usize) -> Result<Self, DomainError> {
        if max_turns == 0 {
            return Err(DomainError::InvalidCapacity(
                "max_turns must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            messages: vec![ConversationMessage::system(system_prompt)],
            max_turns,
        })
    }

    /// Create a history with [`DEFAULT_MAX_TURNS`]
    pub fn with_default_turns(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![ConversationMessage::system(system_prompt)],
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    /// Maximum number of messages kept after a trim (system prompt included)
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.max_turns * 2 + 1
    }

    /// Configured number of user/assistant exchanges
    #[must_use]
    pub const fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Append a message
    ///
    /// A system message replaces the pinned prompt at index 0 instead of being
    /// appended. An assistant message triggers [`trim`](Self::trim).
    pub fn append(&mut self, message: ConversationMessage) {
        match message.role() {
            MessageRole::System => self.messages[0] = message,
            MessageRole::User => self.messages.push(message),
            MessageRole::Assistant => {
                self.messages.push(message);
                self.trim();
            },
        }
    }

    /// Append a user message (never trims)
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.append(ConversationMessage::user(content));
    }

    /// Append an assistant message and trim
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.append(ConversationMessage::assistant(content));
    }

    /// Drop the oldest non-system messages until the log fits its capacity
    ///
    /// Returns the number of messages removed.
    pub fn trim(&mut self) -> usize {
        let cap = self.capacity();
        if self.messages.len() <= cap {
            return 0;
        }

        let excess = self.messages.len() - cap;
        self.messages.drain(1..=excess);
        excess
    }

    /// Owned copy of the current log, oldest first
    #[must_use]
    pub fn snapshot(&self) -> Vec<ConversationMessage> {
        self.messages.clone()
    }

    /// Borrow the current log, oldest first
    #[must_use]
    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    /// The pinned system prompt
    #[must_use]
    pub fn system_prompt(&self) -> &str {
        self.messages[0].content()
    }

    /// Replace the pinned system prompt in place
    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.messages[0] = ConversationMessage::system(prompt);
    }

    /// Remove every user/assistant message, keeping the system prompt
    pub fn clear(&mut self) {
        self.messages.truncate(1);
    }

    /// Number of messages including the system prompt
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True when no user/assistant message has been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.len() == 1
    }

    /// Most recent message
    #[must_use]
    pub fn last(&self) -> Option<&ConversationMessage> {
        self.messages.last()
    }
}
