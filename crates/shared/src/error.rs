//! Application-wide error types.

use thiserror::Error;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Upload request carried no file.
    #[error("No file uploaded")]
    NoFileProvided,

    /// Malformed request.
    #[error("{0}")]
    BadRequest(String),

    /// Key does not name a storable object.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Request body exceeds the configured limit.
    #[error("Upload too large")]
    PayloadTooLarge,

    /// Resource not found.
    #[error("File not found")]
    NotFound(String),

    /// Backend could not persist the upload.
    #[error("Upload failed: {0}")]
    StorageWrite(String),

    /// Backend could not serve the object.
    #[error("Download failed: {0}")]
    StorageRead(String),

    /// Retrieval URL could not be built or encoded.
    #[error("Invalid retrieval URL: {0}")]
    InvalidUrl(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NoFileProvided | Self::BadRequest(_) | Self::InvalidKey(_) => 400,
            Self::NotFound(_) => 404,
            Self::PayloadTooLarge => 413,
            Self::StorageWrite(_)
            | Self::StorageRead(_)
            | Self::InvalidUrl(_)
            | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NoFileProvided => "NO_FILE_PROVIDED",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::InvalidKey(_) => "INVALID_KEY",
            Self::NotFound(_) => "NOT_FOUND",
            Self::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            Self::StorageWrite(_) => "STORAGE_WRITE_ERROR",
            Self::StorageRead(_) => "STORAGE_READ_ERROR",
            Self::InvalidUrl(_) => "INVALID_URL",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
