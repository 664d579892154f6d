//! Streaming client for OpenAI-compatible chat completions.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ProviderConfig;
use crate::llm::client::{ChatModel, LlmError, TokenStream};
use crate::llm::sse::token_stream;
use crate::memory::buffer::ChatMessage;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    stream: bool,
}

/// Chat model backed by `POST {api_base}/chat/completions` with `stream: true`.
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
    temperature: f32,
}

impl OpenAiClient {
    pub fn new(config: &ProviderConfig, api_key: String) -> Result<Self, LlmError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn stream_chat(&self, messages: &[ChatMessage]) -> Result<TokenStream, LlmError> {
        debug!(
            model = self.model,
            messages = messages.len(),
            "Starting streamed chat completion"
        );

        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            stream: true,
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    warn!(status = status.as_u16(), "Failed to read provider error body: {e}");
                    String::new()
                }
            };
            warn!(status = status.as_u16(), "Provider rejected chat completion");
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(Box::pin(token_stream(response.bytes_stream())))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
