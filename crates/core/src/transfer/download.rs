//! Download pipeline.

use std::sync::Arc;

use tracing::debug;

use super::error::DownloadError;
use crate::storage::{ResolvedLocation, StorageBackend};

/// Locates stored objects for download.
///
/// Whether to stream or redirect is left to the caller, driven by the
/// [`ResolvedLocation`] variant.
pub struct DownloadPipeline {
    storage: Arc<dyn StorageBackend>,
}

impl DownloadPipeline {
    /// Create a new download pipeline.
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    /// Name of the active backend.
    #[must_use]
    pub fn backend_kind(&self) -> &'static str {
        self.storage.kind()
    }

    /// Resolve `key` to a stream or a redirect.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown (local backend), malformed, or the
    /// backend fails.
    pub async fn download(&self, key: &str) -> Result<ResolvedLocation, DownloadError> {
        let location = self.storage.resolve(key).await?;
        match &location {
            ResolvedLocation::DirectStream(stream) => debug!(
                key,
                content_length = stream.content_length,
                "Resolved to direct stream"
            ),
            ResolvedLocation::RedirectUrl(access) => debug!(
                key,
                expires_at = %access.expires_at,
                "Resolved to signed redirect"
            ),
        }
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::TryStreamExt;

    use crate::storage::{LocalDisk, ObjectStore, StorageConfig, StorageProvider};

    #[tokio::test]
    async fn test_local_download_streams_bytes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let disk = Arc::new(LocalDisk::open(dir.path()).await.expect("open"));
        disk.put("1-a.pdf", Bytes::from_static(b"0123456789"), "application/pdf")
            .await
            .expect("put");

        let pipeline = DownloadPipeline::new(disk);
        assert_eq!(pipeline.backend_kind(), "local");

        let ResolvedLocation::DirectStream(stream) =
            pipeline.download("1-a.pdf").await.expect("download")
        else {
            panic!("expected direct stream");
        };
        let body: Vec<u8> = stream
            .body
            .map_ok(|chunk| chunk.to_vec())
            .try_concat()
            .await
            .expect("body");
        assert_eq!(body, b"0123456789");
    }

    #[tokio::test]
    async fn test_local_unknown_key_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let disk = Arc::new(LocalDisk::open(dir.path()).await.expect("open"));
        let pipeline = DownloadPipeline::new(disk);

        assert!(matches!(
            pipeline.download("unknown-key").await,
            Err(DownloadError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_object_store_unknown_key_redirects() {
        let config = StorageConfig::new(StorageProvider::s3(
            "docdrop-test",
            "AKIDEXAMPLE",
            "secret",
            "us-east-1",
        ));
        let store = Arc::new(ObjectStore::from_config(&config).expect("store"));
        let pipeline = DownloadPipeline::new(store);

        let location = pipeline.download("unknown-key").await.expect("should sign");
        assert!(matches!(location, ResolvedLocation::RedirectUrl(_)));
    }
}
