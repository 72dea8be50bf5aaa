//! Transfer types and data structures.

use bytes::Bytes;
use url::Url;

use crate::codec::CodeImage;
use crate::storage::StoredObject;

/// A file as received from the client.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    /// File name supplied by the client.
    pub original_name: String,
    /// MIME type supplied by the client.
    pub content_type: String,
    /// File contents.
    pub bytes: Bytes,
}

impl IncomingFile {
    /// Create an incoming file.
    #[must_use]
    pub fn new(
        original_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            original_name: original_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }
}

/// Progress of an upload through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    /// Request accepted with a payload.
    Received,
    /// Storage key generated.
    KeyAssigned,
    /// Bytes written to the backend.
    Persisted,
    /// Public retrieval URL built.
    UrlComputed,
    /// QR code rendered.
    Encoded,
    /// Receipt handed back.
    Done,
}

impl UploadStage {
    /// Stage name for logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::KeyAssigned => "key_assigned",
            Self::Persisted => "persisted",
            Self::UrlComputed => "url_computed",
            Self::Encoded => "encoded",
            Self::Done => "done",
        }
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    /// What was stored.
    pub object: StoredObject,
    /// Public URL resolving to the download endpoint for the object.
    pub retrieval_url: Url,
    /// QR code encoding `retrieval_url`.
    pub code: CodeImage,
}
