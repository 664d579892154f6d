//! HTTP-facing errors.
//!
//! Callers never see the cause of a failure: everything maps to a generic
//! `500 Internal Server Error`. Details go to the log.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("generation failed: {0}")]
    Generation(String),

    #[error("metrics encoding failed: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self, "Request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}

/// Terminates a response body whose stream already started.
#[derive(Error, Debug)]
#[error("stream aborted: {0}")]
pub struct StreamAborted(pub String);
