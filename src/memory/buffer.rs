//! Message turns and the per-conversation history buffer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Author of a message turn, using the provider's wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered history of one conversation.
///
/// Grows without bound; turns are only ever appended as complete
/// user/assistant exchanges.
#[derive(Debug, Clone, Default)]
pub struct ConversationBuffer {
    messages: Vec<ChatMessage>,
}

impl ConversationBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished exchange.
    pub fn save_exchange(&mut self, input: impl Into<String>, output: impl Into<String>) {
        self.messages.push(ChatMessage::user(input));
        self.messages.push(ChatMessage::assistant(output));
    }

    /// All turns, oldest first.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Number of completed exchanges.
    pub fn exchanges(&self) -> usize {
        self.messages.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
