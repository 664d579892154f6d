//! chat-relay: streaming chat relay for hosted LLMs.
//!
//! Accepts chat messages over HTTP, forwards them (with the conversation's
//! prior turns) to an OpenAI-compatible provider, and streams the generated
//! tokens back as they arrive. Conversation memory lives in process memory
//! for the lifetime of the server.

pub mod chain;
pub mod config;
pub mod error;
pub mod llm;
pub mod memory;
pub mod metrics;
pub mod server;
