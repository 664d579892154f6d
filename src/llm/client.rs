//! Provider-agnostic chat model interface.

use std::pin::Pin;

use async_trait::async_trait;
use futures::stream::Stream;
use thiserror::Error;

use crate::memory::buffer::ChatMessage;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("provider error: {0}")]
    Provider(String),

    #[error("malformed stream chunk: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("stream interrupted: {0}")]
    Transport(String),
}

/// Token fragments in generation order.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// A remote chat model that delivers its output incrementally.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Start a generation over the given messages.
    ///
    /// Errors returned here happen before any token is produced; errors
    /// inside the stream happen mid-generation.
    async fn stream_chat(&self, messages: &[ChatMessage]) -> Result<TokenStream, LlmError>;

    /// Model name/identifier.
    fn model_name(&self) -> &str;
}
