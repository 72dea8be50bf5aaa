//! Storage configuration types.

use std::path::PathBuf;

use docdrop_shared::config::{StorageBackendKind, StorageSettings};

use super::error::StorageError;

/// Storage provider configuration.
#[derive(Debug, Clone)]
pub enum StorageProvider {
    /// S3-compatible storage: AWS S3, Cloudflare R2, MinIO
    S3 {
        /// Custom endpoint; AWS regional endpoint when absent.
        endpoint: Option<String>,
        /// S3 bucket name.
        bucket: String,
        /// AWS access key ID.
        access_key_id: String,
        /// AWS secret access key.
        secret_access_key: String,
        /// AWS region.
        region: String,
    },
    /// Local filesystem
    LocalFs {
        /// Upload directory.
        root: PathBuf,
    },
}

impl StorageProvider {
    /// Create S3-compatible provider.
    #[must_use]
    pub fn s3(
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self::S3 {
            endpoint: None,
            bucket: bucket.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
        }
    }

    /// Create local filesystem provider.
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Get the provider name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::LocalFs { .. } => "local",
        }
    }
}

/// Storage service configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Presigned download URL TTL in seconds (default: 600 = 10 minutes).
    pub presign_download_ttl_secs: u64,
    /// Stat objects before presigning a download.
    pub probe_existence: bool,
}

impl StorageConfig {
    /// Default download TTL: 10 minutes.
    pub const DEFAULT_DOWNLOAD_TTL: u64 = 600;
    /// Longest lifetime S3 accepts for a presigned URL: 7 days.
    pub const MAX_DOWNLOAD_TTL: u64 = 7 * 24 * 3600;

    /// Create a new storage config with default settings.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            presign_download_ttl_secs: Self::DEFAULT_DOWNLOAD_TTL,
            probe_existence: false,
        }
    }

    /// Set presigned download URL TTL.
    #[must_use]
    pub fn with_download_ttl(mut self, secs: u64) -> Self {
        self.presign_download_ttl_secs = secs;
        self
    }

    /// Check object existence before presigning.
    #[must_use]
    pub fn with_probe_existence(mut self, probe: bool) -> Self {
        self.probe_existence = probe;
        self
    }

    /// Validate loaded settings into a storage configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the S3 backend is selected without a
    /// bucket, region or credentials, or when the download TTL is out of range.
    pub fn from_settings(settings: &StorageSettings) -> Result<Self, StorageError> {
        let provider = match settings.effective_backend() {
            StorageBackendKind::Local => StorageProvider::local_fs(&settings.local_dir),
            StorageBackendKind::S3 => {
                let mut missing = Vec::new();
                let mut require = |value: &Option<String>, name: &'static str| {
                    let value = value.as_deref().map(str::trim).unwrap_or_default();
                    if value.is_empty() {
                        missing.push(name);
                    }
                    value.to_string()
                };

                let bucket = require(&settings.bucket, "bucket");
                let region = require(&settings.region, "region");
                let access_key_id = require(&settings.access_key_id, "access_key_id");
                let secret_access_key =
                    require(&settings.secret_access_key, "secret_access_key");

                if !missing.is_empty() {
                    return Err(StorageError::configuration(format!(
                        "s3 backend requires {}",
                        missing.join(", ")
                    )));
                }

                StorageProvider::S3 {
                    endpoint: settings
                        .endpoint
                        .clone()
                        .filter(|endpoint| !endpoint.trim().is_empty()),
                    bucket,
                    access_key_id,
                    secret_access_key,
                    region,
                }
            }
        };

        let ttl = settings.download_url_ttl_secs;
        if ttl == 0 || ttl > Self::MAX_DOWNLOAD_TTL {
            return Err(StorageError::configuration(format!(
                "download_url_ttl_secs must be between 1 and {}, got {ttl}",
                Self::MAX_DOWNLOAD_TTL
            )));
        }

        Ok(Self::new(provider)
            .with_download_ttl(ttl)
            .with_probe_existence(settings.probe_existence))
    }
}
