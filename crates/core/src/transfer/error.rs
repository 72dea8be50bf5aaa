//! Transfer error types.

use docdrop_shared::AppError;
use thiserror::Error;

use crate::codec::CodecError;
use crate::storage::StorageError;
use crate::url_resolver::UrlError;

/// Upload pipeline failures. Each variant is a terminal state.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Request carried no file. Nothing was written.
    #[error("no file uploaded")]
    NoFileProvided,

    /// Backend rejected the write. The key was never published.
    #[error("failed to store {key}: {source}")]
    WriteFailed {
        /// Key the write was attempted under.
        key: String,
        /// Backend error.
        source: StorageError,
    },

    /// Retrieval URL could not be built.
    #[error("failed to build retrieval URL: {0}")]
    Url(#[from] UrlError),

    /// Retrieval URL could not be encoded.
    #[error("failed to encode retrieval URL: {0}")]
    Encode(#[from] CodecError),
}

impl UploadError {
    /// Name of the terminal state for logs.
    #[must_use]
    pub fn terminal_state(&self) -> &'static str {
        match self {
            Self::NoFileProvided => "rejected_no_file",
            Self::WriteFailed { .. } => "write_failed",
            Self::Url(_) | Self::Encode(_) => "encode_failed",
        }
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::NoFileProvided => Self::NoFileProvided,
            UploadError::WriteFailed { source, .. } => Self::StorageWrite(source.to_string()),
            UploadError::Url(e) => Self::InvalidUrl(e.to_string()),
            UploadError::Encode(e) => Self::InvalidUrl(e.to_string()),
        }
    }
}

/// Download pipeline failures.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// No object under the key.
    #[error("file not found: {0}")]
    NotFound(String),

    /// Key could never have been issued.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Backend failed to locate the object.
    #[error("failed to resolve download: {0}")]
    ResolutionFailed(StorageError),
}

impl From<StorageError> for DownloadError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { key } => Self::NotFound(key),
            StorageError::InvalidKey(key) => Self::InvalidKey(key),
            other => Self::ResolutionFailed(other),
        }
    }
}

impl From<DownloadError> for AppError {
    fn from(err: DownloadError) -> Self {
        match err {
            DownloadError::NotFound(key) => Self::NotFound(key),
            DownloadError::InvalidKey(key) => Self::InvalidKey(key),
            DownloadError::ResolutionFailed(e) => Self::StorageRead(e.to_string()),
        }
    }
}
