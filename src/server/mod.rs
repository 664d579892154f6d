//! HTTP server for the chat relay.
//!
//! - [`api`]: Routes, shared state and handlers
//! - [`streaming`]: Raw token streaming of chat responses

pub mod api;
pub mod streaming;
