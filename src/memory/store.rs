//! Conversation store: maps conversation IDs to their history buffers.
//!
//! Slots are created lazily on first use and live for the lifetime of the
//! process. Nothing is evicted or persisted.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::memory::buffer::{ChatMessage, ConversationBuffer};

/// In-process conversation memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    conversations: HashMap<String, ConversationBuffer>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the buffer for a conversation, creating an empty one on first use.
    pub fn get_or_create(&mut self, conversation_id: &str) -> &mut ConversationBuffer {
        if !self.conversations.contains_key(conversation_id) {
            debug!(conversation_id, "Creating conversation memory");
        }
        self.conversations
            .entry(conversation_id.to_string())
            .or_default()
    }

    /// Get an existing conversation buffer.
    pub fn get(&self, conversation_id: &str) -> Option<&ConversationBuffer> {
        self.conversations.get(conversation_id)
    }

    /// Snapshot of a conversation's turns (empty for unknown IDs).
    pub fn history(&self, conversation_id: &str) -> Vec<ChatMessage> {
        self.conversations
            .get(conversation_id)
            .map(|b| b.messages().to_vec())
            .unwrap_or_default()
    }

    /// Append a finished exchange, creating the slot if needed.
    pub fn save_exchange(&mut self, conversation_id: &str, input: &str, output: &str) {
        self.get_or_create(conversation_id)
            .save_exchange(input, output);
    }

    /// Number of conversations held.
    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }
}

/// Thread-safe wrapper around the store.
pub type SharedMemoryStore = Arc<RwLock<MemoryStore>>;

/// Create a new thread-safe store.
pub fn new_shared_store() -> SharedMemoryStore {
    Arc::new(RwLock::new(MemoryStore::new()))
}
