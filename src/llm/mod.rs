//! Hosted model access.
//!
//! - [`client`]: The [`ChatModel`](client::ChatModel) trait and its error type
//! - [`openai`]: Streaming client for OpenAI-compatible chat completions
//! - [`sse`]: Server-Sent Events decoding of the provider's response body

pub mod client;
pub mod openai;
pub mod sse;
