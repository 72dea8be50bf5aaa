//! Backend contract and the values it hands back.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;
use super::local::LocalDisk;
use super::s3::ObjectStore;

/// Chunked object body.
pub type ByteStream = BoxStream<'static, std::io::Result<Bytes>>;

/// A document persisted by a backend. Write-once: there is no update path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Unique storage key.
    pub key: String,
    /// File name as uploaded.
    pub original_name: String,
    /// MIME type as uploaded.
    pub content_type: String,
    /// Payload size in bytes.
    pub size_bytes: u64,
    /// When the object was persisted.
    pub created_at: DateTime<Utc>,
}

/// Object bytes served straight from the medium.
pub struct ObjectStream {
    /// File name to offer the client when saving.
    pub file_name: String,
    /// MIME type for the response.
    pub content_type: String,
    /// Total size in bytes.
    pub content_length: u64,
    /// The bytes.
    pub body: ByteStream,
}

impl fmt::Debug for ObjectStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStream")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Presigned, time-limited read access to an object. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedAccess {
    /// The presigned URL.
    pub url: String,
    /// When the signature was issued.
    pub issued_at: DateTime<Utc>,
    /// When the URL expires.
    pub expires_at: DateTime<Utc>,
}

/// Where a caller gets an object's bytes from.
#[derive(Debug)]
pub enum ResolvedLocation {
    /// Stream the bytes in the response.
    DirectStream(ObjectStream),
    /// Send the client elsewhere.
    RedirectUrl(SignedAccess),
}

/// A medium that stores uploads and locates them again.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Short backend name for logs and health output.
    fn kind(&self) -> &'static str;

    /// Persist `bytes` under `key`.
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), StorageError>;

    /// Locate the object stored under `key`.
    async fn resolve(&self, key: &str) -> Result<ResolvedLocation, StorageError>;
}

/// Build the backend selected by `config`.
///
/// Runs once at startup; the returned backend is shared for the process lifetime.
///
/// # Errors
///
/// Returns an error if the upload directory cannot be created or the object
/// store client cannot be configured.
pub async fn connect(config: &StorageConfig) -> Result<Arc<dyn StorageBackend>, StorageError> {
    match &config.provider {
        StorageProvider::LocalFs { root } => Ok(Arc::new(LocalDisk::open(root).await?)),
        StorageProvider::S3 { .. } => Ok(Arc::new(ObjectStore::from_config(config)?)),
    }
}
