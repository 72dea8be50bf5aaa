//! Document download route.

use axum::{
    Router,
    body::Body,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};

use crate::{AppState, error::ApiError};
use docdrop_core::identity::attachment_disposition;
use docdrop_core::storage::{ObjectStream, ResolvedLocation, SignedAccess};
use docdrop_shared::AppError;

/// Creates the download routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/download/{key}", get(download))
}

/// GET `/download/{key}`
///
/// Streams the object as an attachment, or redirects to a signed URL when the
/// backend hands one out.
async fn download(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    match state.downloads.download(&key).await? {
        ResolvedLocation::DirectStream(stream) => stream_response(stream),
        ResolvedLocation::RedirectUrl(access) => redirect_response(&access),
    }
}

fn stream_response(stream: ObjectStream) -> Result<Response, ApiError> {
    let disposition = HeaderValue::from_str(&attachment_disposition(&stream.file_name))
        .map_err(|e| AppError::Internal(format!("invalid file name header: {e}")))?;
    let content_type = HeaderValue::from_str(&stream.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_LENGTH, HeaderValue::from(stream.content_length)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(stream.body),
    )
        .into_response())
}

fn redirect_response(access: &SignedAccess) -> Result<Response, ApiError> {
    let location = HeaderValue::from_str(&access.url)
        .map_err(|e| AppError::StorageRead(format!("unusable signed URL: {e}")))?;
    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}
