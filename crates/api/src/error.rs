//! Error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, warn};

use docdrop_core::transfer::{DownloadError, UploadError};
use docdrop_shared::AppError;

/// An [`AppError`] rendered as `{error, code}` JSON.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        Self(err.into())
    }
}

impl From<DownloadError> for ApiError {
    fn from(err: DownloadError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let code = self.0.error_code();

        if status.is_server_error() {
            error!(error = %self.0, code, "Request failed");
        } else {
            warn!(error = %self.0, code, "Request rejected");
        }

        (
            status,
            Json(json!({
                "error": self.0.to_string(),
                "code": code,
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use rstest::rstest;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[rstest]
    #[case(
        ApiError::from(UploadError::NoFileProvided),
        StatusCode::BAD_REQUEST,
        "No file uploaded",
        "NO_FILE_PROVIDED"
    )]
    #[case(
        ApiError::from(DownloadError::NotFound("k".into())),
        StatusCode::NOT_FOUND,
        "File not found",
        "NOT_FOUND"
    )]
    #[case(
        ApiError::from(DownloadError::InvalidKey("../k".into())),
        StatusCode::BAD_REQUEST,
        "Invalid key: ../k",
        "INVALID_KEY"
    )]
    #[case(
        ApiError(AppError::PayloadTooLarge),
        StatusCode::PAYLOAD_TOO_LARGE,
        "Upload too large",
        "PAYLOAD_TOO_LARGE"
    )]
    #[case(
        ApiError(AppError::Internal("boom".into())),
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal error: boom",
        "INTERNAL_ERROR"
    )]
    #[tokio::test]
    async fn test_error_response(
        #[case] err: ApiError,
        #[case] status: StatusCode,
        #[case] message: &str,
        #[case] code: &str,
    ) {
        let response = err.into_response();
        assert_eq!(response.status(), status);

        let body = body_json(response).await;
        assert_eq!(body["error"], message);
        assert_eq!(body["code"], code);
    }
}
