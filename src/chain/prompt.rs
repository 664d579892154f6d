//! Static chat prompt template.

use crate::memory::buffer::ChatMessage;

/// System message, then the conversation history, then the new user input.
#[derive(Debug, Clone)]
pub struct ChatPromptTemplate {
    system: String,
}

impl ChatPromptTemplate {
    pub fn new(system: impl Into<String>) -> Self {
        Self {
            system: system.into(),
        }
    }

    pub fn system(&self) -> &str {
        &self.system
    }

    /// Render the messages submitted to the model for one turn.
    pub fn format_messages(&self, history: &[ChatMessage], input: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(self.system.clone()));
        messages.extend_from_slice(history);
        messages.push(ChatMessage::user(input));
        messages
    }
}
