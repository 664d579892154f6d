//! Chat relay HTTP API.
//!
//! - POST /chat
//! - GET /health
//! - GET /metrics

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, Instrument};
use uuid::Uuid;

use crate::chain::conversation::{ChainEvent, StreamingConversationChain};
use crate::error::ApiError;
use crate::metrics::Metrics;
use crate::server::streaming::{chain_to_body_stream, EVENT_STREAM};

/// Application state shared across handlers.
pub struct AppState {
    pub chain: StreamingConversationChain,
    pub metrics: Arc<Metrics>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(chain: StreamingConversationChain, metrics: Metrics) -> Self {
        Self {
            chain,
            metrics: Arc::new(metrics),
            start_time: Instant::now(),
        }
    }
}

/// Build the axum router with all API routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

// ─── Request/Response Types ────────────────────────────────────────────────

/// Chat request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub conversation_id: String,
    pub message: String,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub model: String,
    pub conversations: usize,
}

// ─── Route Handlers ────────────────────────────────────────────────────────

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Response, ApiError> {
    let request_id = Uuid::new_v4().to_string();
    let span = tracing::info_span!("chat", request_id, conversation_id = req.conversation_id);

    async move {
        info!(chars = req.message.len(), "Chat request");
        state.metrics.chat_requests.inc();

        let mut rx = state.chain.generate(req.conversation_id, req.message).await;

        // Hold the response until the model produced something, so a call
        // that fails outright becomes a plain 500.
        let first = rx.recv().await;
        if let Some(ChainEvent::Error(e)) = first {
            state.metrics.generation_failures.inc();
            return Err(ApiError::Generation(e));
        }

        let stream = chain_to_body_stream(first, rx, state.metrics.clone());
        Ok(([(header::CONTENT_TYPE, EVENT_STREAM)], Body::from_stream(stream)).into_response())
    }
    .instrument(span)
    .await
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let conversations = state.chain.memory().read().await.len();

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        model: state.chain.model_name().to_string(),
        conversations,
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> Result<String, ApiError> {
    let conversations = state.chain.memory().read().await.len();
    state.metrics.conversations.set(conversations as i64);
    Ok(state.metrics.render()?)
}
