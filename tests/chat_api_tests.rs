//! End-to-end tests for the HTTP API against a stub model backend.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream;
use serde_json::json;
use tokio::net::TcpListener;

use chat_relay::chain::conversation::StreamingConversationChain;
use chat_relay::chain::prompt::ChatPromptTemplate;
use chat_relay::llm::client::{ChatModel, LlmError, TokenStream};
use chat_relay::memory::buffer::{ChatMessage, Role};
use chat_relay::memory::store::new_shared_store;
use chat_relay::metrics::Metrics;
use chat_relay::server::api::{build_router, AppState, HealthResponse};

/// Answers "echo: <input>" in two fragments and keeps every prompt it saw.
#[derive(Default)]
struct EchoModel {
    prompts: Mutex<Vec<Vec<ChatMessage>>>,
}

#[async_trait]
impl ChatModel for EchoModel {
    async fn stream_chat(&self, messages: &[ChatMessage]) -> Result<TokenStream, LlmError> {
        self.prompts.lock().unwrap().push(messages.to_vec());
        let input = messages.last().map(|m| m.content.clone()).unwrap_or_default();
        let tokens: Vec<Result<String, LlmError>> = vec![Ok("echo: ".to_string()), Ok(input)];
        Ok(Box::pin(stream::iter(tokens)))
    }

    fn model_name(&self) -> &str {
        "echo"
    }
}

/// Rejects every call before producing a token.
struct RejectingModel;

#[async_trait]
impl ChatModel for RejectingModel {
    async fn stream_chat(&self, _messages: &[ChatMessage]) -> Result<TokenStream, LlmError> {
        Err(LlmError::Status {
            status: 401,
            body: "invalid api key".to_string(),
        })
    }

    fn model_name(&self) -> &str {
        "rejecting"
    }
}

async fn spawn_app(model: Arc<dyn ChatModel>) -> String {
    let chain = StreamingConversationChain::new(
        model,
        new_shared_store(),
        ChatPromptTemplate::new("answer from the articles"),
    );
    let state = Arc::new(AppState::new(chain, Metrics::new().unwrap()));
    let app = build_router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

async fn chat(base: &str, conversation_id: &str, message: &str) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{base}/chat"))
        .json(&json!({ "conversation_id": conversation_id, "message": message }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_chat_streams_tokens() {
    let base = spawn_app(Arc::new(EchoModel::default())).await;

    let response = chat(&base, "cat-conversation", "what's their size?").await;
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/event-stream"
    );

    let body = response.text().await.unwrap();
    assert!(!body.is_empty());
    assert_eq!(body, "echo: what's their size?");
}

#[tokio::test]
async fn test_memory_accumulates_per_conversation() {
    let model = Arc::new(EchoModel::default());
    let base = spawn_app(model.clone()).await;

    let first = chat(&base, "cats", "tell me about cats").await.text().await.unwrap();
    chat(&base, "cats", "what's their size?").await.text().await.unwrap();

    let prompts = model.prompts.lock().unwrap();
    let second = &prompts[1];
    assert_eq!(second[0].role, Role::System);
    assert_eq!(second[1], ChatMessage::user("tell me about cats"));
    assert_eq!(second[2], ChatMessage::assistant(first));
    assert_eq!(second[3], ChatMessage::user("what's their size?"));
}

#[tokio::test]
async fn test_conversations_do_not_share_memory() {
    let model = Arc::new(EchoModel::default());
    let base = spawn_app(model.clone()).await;

    chat(&base, "cats", "tell me about cats").await.text().await.unwrap();
    chat(&base, "dogs", "tell me about dogs").await.text().await.unwrap();

    let prompts = model.prompts.lock().unwrap();
    let dogs = &prompts[1];
    assert_eq!(dogs.len(), 2);
    assert!(dogs.iter().all(|m| !m.content.contains("cats")));
}

#[tokio::test]
async fn test_provider_failure_is_generic_500() {
    let base = spawn_app(Arc::new(RejectingModel)).await;

    let response = chat(&base, "c1", "hello").await;
    assert_eq!(response.status(), 500);
    let body = response.text().await.unwrap();
    assert!(!body.contains("invalid api key"));
}

#[tokio::test]
async fn test_malformed_request_rejected() {
    let base = spawn_app(Arc::new(EchoModel::default())).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/chat"))
        .json(&json!({ "conversation_id": "c1" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_health_and_metrics() {
    let base = spawn_app(Arc::new(EchoModel::default())).await;
    chat(&base, "a", "hi").await.text().await.unwrap();
    chat(&base, "b", "hi").await.text().await.unwrap();

    let health: HealthResponse = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health.status, "ok");
    assert_eq!(health.model, "echo");
    assert_eq!(health.conversations, 2);

    let metrics = reqwest::get(format!("{base}/metrics"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(metrics.contains("chat_relay_chat_requests_total 2"));
    assert!(metrics.contains("chat_relay_tokens_streamed_total 4"));
    assert!(metrics.contains("chat_relay_conversations 2"));
}
