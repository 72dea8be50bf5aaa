//! Document upload route.

use axum::{
    Json, Router,
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Serialize;
use tracing::info;

use crate::{AppState, error::ApiError, extractors::ForwardedContext};
use docdrop_core::transfer::IncomingFile;
use docdrop_shared::AppError;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Creates the upload routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/upload", post(upload))
}

/// Response for a stored upload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Public retrieval URL.
    pub file_url: String,
    /// QR code for `file_url` as a PNG data URI.
    pub qr_code: String,
}

/// POST `/upload`
///
/// Stores the file from the configured multipart field and answers with its
/// retrieval URL and QR code.
async fn upload(
    State(state): State<AppState>,
    ForwardedContext(ctx): ForwardedContext,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let file = take_file(&mut multipart, &state.upload_field).await?;

    let receipt = state.uploads.upload(file, &ctx).await.inspect_err(|e| {
        info!(terminal_state = e.terminal_state(), "Upload did not complete");
    })?;

    info!(
        key = %receipt.object.key,
        url = %receipt.retrieval_url,
        "Upload stored"
    );

    Ok((
        StatusCode::OK,
        Json(UploadResponse {
            file_url: receipt.retrieval_url.to_string(),
            qr_code: receipt.code.to_data_uri(),
        }),
    )
        .into_response())
}

/// Reads the first file part named `field_name`. Other parts are drained.
async fn take_file(
    multipart: &mut Multipart,
    field_name: &str,
) -> Result<Option<IncomingFile>, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let file_name = match field.file_name() {
            Some(name) if !name.is_empty() && field.name() == Some(field_name) => name.to_string(),
            _ => continue,
        };
        let content_type = field
            .content_type()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        return Ok(Some(IncomingFile::new(file_name, content_type, bytes)));
    }
    Ok(None)
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::BadRequest(err.body_text())
    }
}
