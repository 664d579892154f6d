//! Conversation chain: coordinates memory, prompt and model for one turn.
//!
//! For each request the chain:
//! 1. Looks up (or lazily creates) the conversation's memory slot
//! 2. Renders the prompt from the stored history and the new message
//! 3. Streams the model's tokens to the returned channel
//! 4. Records the finished exchange in memory

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::chain::prompt::ChatPromptTemplate;
use crate::llm::client::ChatModel;
use crate::memory::store::SharedMemoryStore;

/// Default capacity of the per-request token channel.
pub const DEFAULT_TOKEN_BUFFER: usize = 32;

/// Progress of one generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainEvent {
    /// A new token fragment was generated.
    Token(String),
    /// Generation is complete and the exchange was saved.
    Done { fragments: usize },
    /// Generation failed; memory was left untouched.
    Error(String),
}

/// Streams model output while remembering each conversation.
#[derive(Clone)]
pub struct StreamingConversationChain {
    model: Arc<dyn ChatModel>,
    memory: SharedMemoryStore,
    prompt: ChatPromptTemplate,
    token_buffer: usize,
}

impl StreamingConversationChain {
    pub fn new(
        model: Arc<dyn ChatModel>,
        memory: SharedMemoryStore,
        prompt: ChatPromptTemplate,
    ) -> Self {
        Self {
            model,
            memory,
            prompt,
            token_buffer: DEFAULT_TOKEN_BUFFER,
        }
    }

    /// Override the token channel capacity.
    pub fn with_token_buffer(mut self, token_buffer: usize) -> Self {
        self.token_buffer = token_buffer.max(1);
        self
    }

    pub fn memory(&self) -> &SharedMemoryStore {
        &self.memory
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Run one conversational turn, streaming events to the returned receiver.
    ///
    /// The memory slot exists once this returns. The exchange is saved before
    /// [`ChainEvent::Done`] is sent, so a caller that has drained the channel
    /// sees it in the next turn's history.
    pub async fn generate(
        &self,
        conversation_id: String,
        message: String,
    ) -> mpsc::Receiver<ChainEvent> {
        let (tx, rx) = mpsc::channel(self.token_buffer);

        let history = {
            let mut memory = self.memory.write().await;
            memory.get_or_create(&conversation_id).messages().to_vec()
        };
        let messages = self.prompt.format_messages(&history, &message);

        let model = self.model.clone();
        let memory = self.memory.clone();

        tokio::spawn(async move {
            info!(
                conversation_id,
                history = history.len(),
                model = model.model_name(),
                "Starting generation"
            );

            let mut stream = match model.stream_chat(&messages).await {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(conversation_id, "Generation failed to start: {e}");
                    let _ = tx.send(ChainEvent::Error(e.to_string())).await;
                    return;
                }
            };

            let mut completion = String::new();
            let mut fragments = 0;

            while let Some(item) = stream.next().await {
                match item {
                    Ok(token) => {
                        completion.push_str(&token);
                        fragments += 1;

                        if tx.send(ChainEvent::Token(token)).await.is_err() {
                            // Receiver dropped, stop generating.
                            debug!(conversation_id, fragments, "Client went away");
                            return;
                        }
                    }
                    Err(e) => {
                        warn!(conversation_id, fragments, "Generation failed: {e}");
                        let _ = tx.send(ChainEvent::Error(e.to_string())).await;
                        return;
                    }
                }
            }

            // Buffered sends succeed after a disconnect; never save a reply
            // the caller did not receive.
            if tx.is_closed() {
                debug!(conversation_id, fragments, "Client went away");
                return;
            }

            memory
                .write()
                .await
                .save_exchange(&conversation_id, &message, &completion);

            let _ = tx.send(ChainEvent::Done { fragments }).await;

            info!(
                conversation_id,
                fragments,
                chars = completion.len(),
                "Generation complete"
            );
        });

        rx
    }
}
