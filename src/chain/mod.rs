//! Streaming conversation chain.
//!
//! - [`prompt`]: Static chat template (system message, history, input)
//! - [`conversation`]: Per-request generation task tying memory to the model

pub mod conversation;
pub mod prompt;
