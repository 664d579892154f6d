//! Short-term conversation memory.
//!
//! - [`buffer`]: Message turns and the per-conversation history buffer
//! - [`store`]: Shared map from conversation ID to its buffer

pub mod buffer;
pub mod store;
