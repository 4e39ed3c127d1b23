//! API handlers for the redaction server

use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::ServerError;
use crate::AppState;

/// Multipart field carrying the upload
const FILE_FIELD: &str = "file";
const OUTPUT_FILENAME: &str = "redacted-cv.pdf";

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub ok: bool,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

/// An uploaded file and the metadata the client sent with it
struct Upload {
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Bytes,
}

impl Upload {
    fn looks_like_pdf(&self) -> bool {
        let by_name = self
            .file_name
            .as_deref()
            .is_some_and(|name| name.to_ascii_lowercase().ends_with(".pdf"));
        let by_type = self
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("pdf"));
        by_name || by_type
    }
}

/// Keep the body-limit rejection distinct from malformed input
fn multipart_error(context: &str, err: MultipartError) -> ServerError {
    let message = format!("{}: {}", context, err);
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::PayloadTooLarge(message)
    } else {
        ServerError::InvalidRequest(message)
    }
}

/// Pull the `file` field, or the first field carrying a filename
async fn read_upload(mut multipart: Multipart) -> Result<Option<Upload>, ServerError> {
    let mut fallback = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Malformed multipart body", e))?
    {
        let is_file_field = field.name() == Some(FILE_FIELD);
        if !is_file_field && (fallback.is_some() || field.file_name().is_none()) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error("Failed to read upload", e))?;
        let upload = Upload {
            file_name,
            content_type,
            bytes,
        };

        if is_file_field {
            return Ok(Some(upload));
        }
        fallback = Some(upload);
    }

    Ok(fallback)
}

/// Handler: POST /redact
pub async fn handle_redact(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ServerError> {
    let upload = read_upload(multipart)
        .await?
        .ok_or_else(|| ServerError::InvalidRequest("Missing file upload".into()))?;

    info!(
        "Redact request: file={:?}, content_type={:?}, size={}",
        upload.file_name,
        upload.content_type,
        upload.bytes.len()
    );

    if !upload.looks_like_pdf() {
        return Err(ServerError::InvalidRequest(
            "Please upload a PDF file".into(),
        ));
    }
    if upload.bytes.is_empty() {
        return Err(ServerError::InvalidRequest("Uploaded file is empty".into()));
    }

    let redactor = state.redactor.clone();
    let bytes = upload.bytes;
    let result = tokio::task::spawn_blocking(move || redactor.redact(&bytes))
        .await
        .map_err(|e| ServerError::Internal(format!("Redaction task failed: {}", e)))?;

    let redacted = result.map_err(|e| {
        warn!("Redaction rejected ({}): {}", e.kind(), e);
        ServerError::from(e)
    })?;
    debug!("Plan: {:?}", redacted.plan);

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", OUTPUT_FILENAME),
            ),
        ],
        redacted.bytes,
    )
        .into_response())
}
