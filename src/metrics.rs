//! Prometheus counters for the relay.

use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

/// Process-wide relay metrics.
pub struct Metrics {
    registry: Registry,

    /// `POST /chat` requests accepted.
    pub chat_requests: IntCounter,

    /// Token fragments relayed to callers.
    pub tokens_streamed: IntCounter,

    /// Generations that ended in an error.
    pub generation_failures: IntCounter,

    /// Conversations currently held in memory.
    pub conversations: IntGauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("chat_relay".to_string()), None)?;

        let chat_requests = IntCounter::new("chat_requests_total", "Chat requests accepted")?;
        let tokens_streamed =
            IntCounter::new("tokens_streamed_total", "Token fragments relayed to callers")?;
        let generation_failures =
            IntCounter::new("generation_failures_total", "Generations that ended in an error")?;
        let conversations = IntGauge::new("conversations", "Conversations held in memory")?;

        registry.register(Box::new(chat_requests.clone()))?;
        registry.register(Box::new(tokens_streamed.clone()))?;
        registry.register(Box::new(generation_failures.clone()))?;
        registry.register(Box::new(conversations.clone()))?;

        Ok(Self {
            registry,
            chat_requests,
            tokens_streamed,
            generation_failures,
            conversations,
        })
    }

    /// Render all metrics in the Prometheus text format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
