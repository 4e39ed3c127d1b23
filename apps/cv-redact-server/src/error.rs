//! Error types for the redaction server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cv_redact_core::RedactError;
use serde::Serialize;
use thiserror::Error;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Redaction failed: {0}")]
    Redaction(#[from] RedactError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        // Every core failure is a 500; `code` tells the kinds apart
        let (status, code) = match &self {
            ServerError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ServerError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            ServerError::Redaction(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.kind()),
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let message = match &self {
            ServerError::InvalidRequest(msg)
            | ServerError::PayloadTooLarge(msg)
            | ServerError::Internal(msg) => msg.clone(),
            other => other.to_string(),
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
