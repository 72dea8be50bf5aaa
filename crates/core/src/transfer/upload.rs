//! Upload pipeline.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::error::UploadError;
use super::types::{IncomingFile, UploadReceipt, UploadStage};
use crate::codec::RetrievalCodec;
use crate::identity::IdentityGenerator;
use crate::storage::{StorageBackend, StoredObject};
use crate::url_resolver::{RequestContext, UrlResolver};

/// Stores an upload and produces its retrieval URL and QR code.
pub struct UploadPipeline {
    storage: Arc<dyn StorageBackend>,
    identity: IdentityGenerator,
    resolver: UrlResolver,
    codec: RetrievalCodec,
}

impl UploadPipeline {
    /// Create a new upload pipeline.
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>, resolver: UrlResolver) -> Self {
        Self {
            storage,
            identity: IdentityGenerator::new(),
            resolver,
            codec: RetrievalCodec,
        }
    }

    /// Run an upload from `Received` to `Done`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No file was provided (nothing is written)
    /// - The backend write fails
    /// - The retrieval URL cannot be built or encoded
    pub async fn upload(
        &self,
        file: Option<IncomingFile>,
        ctx: &RequestContext,
    ) -> Result<UploadReceipt, UploadError> {
        let Some(file) = file else {
            return Err(UploadError::NoFileProvided);
        };
        debug!(
            stage = UploadStage::Received.as_str(),
            original_name = %file.original_name,
            "Upload received"
        );

        let key = self.identity.assign(&file.original_name);
        debug!(stage = UploadStage::KeyAssigned.as_str(), key, "Key assigned");

        let size_bytes = file.bytes.len() as u64;
        self.storage
            .put(&key, file.bytes, &file.content_type)
            .await
            .map_err(|source| UploadError::WriteFailed {
                key: key.clone(),
                source,
            })?;
        let created_at = Utc::now();
        debug!(
            stage = UploadStage::Persisted.as_str(),
            key,
            backend = self.storage.kind(),
            "Upload persisted"
        );

        let base = self.resolver.resolve(ctx);
        let retrieval_url = self.resolver.retrieval_url(&base, &key)?;
        debug!(
            stage = UploadStage::UrlComputed.as_str(),
            key,
            url = %retrieval_url,
            "Retrieval URL computed"
        );

        let code = self.codec.encode(retrieval_url.as_str())?;
        debug!(stage = UploadStage::Encoded.as_str(), key, "QR code rendered");

        info!(
            stage = UploadStage::Done.as_str(),
            key,
            size_bytes,
            backend = self.storage.kind(),
            "Upload complete"
        );

        Ok(UploadReceipt {
            object: StoredObject {
                key,
                original_name: file.original_name,
                content_type: file.content_type,
                size_bytes,
                created_at,
            },
            retrieval_url,
            code,
        })
    }
}
