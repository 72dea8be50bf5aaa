//! S3-compatible backend using Apache OpenDAL.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use opendal::{ErrorKind, Operator, services};
use tracing::debug;

use super::backend::{ResolvedLocation, SignedAccess, StorageBackend};
use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;
use crate::identity::{attachment_disposition, is_valid_key, original_name};

/// Bucket-backed storage. Downloads are served by presigned redirects.
///
/// Nothing here retries: a failed write surfaces immediately so the client can
/// retry the whole upload.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    operator: Operator,
    bucket: String,
    download_ttl_secs: u64,
    probe_existence: bool,
}

impl ObjectStore {
    /// Create the backend from an S3 provider configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is not S3 or OpenDAL rejects the settings.
    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        let StorageProvider::S3 { bucket, .. } = &config.provider else {
            return Err(StorageError::configuration(
                "object store requires an s3 provider",
            ));
        };
        let operator = Self::create_operator(&config.provider)?;

        Ok(Self {
            operator,
            bucket: bucket.clone(),
            download_ttl_secs: config.presign_download_ttl_secs,
            probe_existence: config.probe_existence,
        })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        let StorageProvider::S3 {
            endpoint,
            bucket,
            access_key_id,
            secret_access_key,
            region,
        } = provider
        else {
            return Err(StorageError::configuration("expected s3 provider"));
        };

        let endpoint = endpoint
            .clone()
            .unwrap_or_else(|| format!("https://s3.{region}.amazonaws.com"));

        // Credentials come from configuration only, never from ambient
        // profiles or instance metadata.
        let builder = services::S3::default()
            .endpoint(&endpoint)
            .bucket(bucket)
            .access_key_id(access_key_id)
            .secret_access_key(secret_access_key)
            .region(region)
            .disable_config_load()
            .disable_ec2_metadata();

        Ok(Operator::new(builder)
            .map_err(|e| StorageError::configuration(e.to_string()))?
            .finish())
    }

    /// Bucket the backend writes to.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Sign a time-limited GET for `key`.
    ///
    /// The signed response is forced to download under the uploaded file name.
    /// The object is not looked up: an absent key still yields a valid
    /// signature, and the client's fetch is what fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is malformed or signing fails.
    pub async fn sign_download(&self, key: &str) -> Result<SignedAccess, StorageError> {
        if !is_valid_key(key) {
            return Err(StorageError::invalid_key(key));
        }

        let issued_at = Utc::now();
        let presigned = self
            .operator
            .presign_read_with(key, Duration::from_secs(self.download_ttl_secs))
            .override_content_disposition(&attachment_disposition(&original_name(key)))
            .await
            .map_err(StorageError::presign)?;

        Ok(SignedAccess {
            url: presigned.uri().to_string(),
            issued_at,
            expires_at: issued_at
                + chrono::Duration::seconds(
                    i64::try_from(self.download_ttl_secs).unwrap_or(i64::MAX),
                ),
        })
    }

    async fn ensure_exists(&self, key: &str) -> Result<(), StorageError> {
        match self.operator.stat(key).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::not_found(key)),
            Err(e) => Err(StorageError::read(e)),
        }
    }
}

#[async_trait]
impl StorageBackend for ObjectStore {
    fn kind(&self) -> &'static str {
        "s3"
    }

    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), StorageError> {
        if !is_valid_key(key) {
            return Err(StorageError::invalid_key(key));
        }

        let size_bytes = bytes.len();
        self.operator
            .write_with(key, bytes)
            .content_type(content_type)
            .await
            .map_err(StorageError::write)?;

        debug!(key, size_bytes, bucket = %self.bucket, "Object uploaded");
        Ok(())
    }

    async fn resolve(&self, key: &str) -> Result<ResolvedLocation, StorageError> {
        if self.probe_existence {
            self.ensure_exists(key).await?;
        }
        self.sign_download(key)
            .await
            .map(ResolvedLocation::RedirectUrl)
    }
}
