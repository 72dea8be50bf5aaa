//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage backend configuration.
    #[serde(default)]
    pub storage: StorageSettings,
    /// Public URL configuration.
    #[serde(default)]
    pub public_url: PublicUrlSettings,
    /// CORS configuration.
    #[serde(default)]
    pub cors: CorsSettings,
    /// Upload endpoint configuration.
    #[serde(default)]
    pub upload: UploadSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

/// Which storage backend serves uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackendKind {
    /// Flat directory on the local filesystem.
    Local,
    /// S3-compatible object storage.
    S3,
}

/// Storage configuration, validated into a provider at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Explicit backend selection. When unset, a configured bucket selects S3.
    #[serde(default)]
    pub backend: Option<StorageBackendKind>,
    /// Upload directory for the local backend.
    #[serde(default = "default_local_dir")]
    pub local_dir: String,
    /// Bucket name.
    #[serde(default)]
    pub bucket: Option<String>,
    /// Bucket region.
    #[serde(default)]
    pub region: Option<String>,
    /// Access key ID.
    #[serde(default)]
    pub access_key_id: Option<String>,
    /// Secret access key.
    #[serde(default)]
    pub secret_access_key: Option<String>,
    /// Custom endpoint for S3-compatible services.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Lifetime of signed download URLs in seconds.
    #[serde(default = "default_download_url_ttl")]
    pub download_url_ttl_secs: u64,
    /// Stat the object before signing a download URL.
    #[serde(default)]
    pub probe_existence: bool,
}

impl StorageSettings {
    /// Backend in effect after applying the bucket-implies-S3 rule.
    #[must_use]
    pub fn effective_backend(&self) -> StorageBackendKind {
        match self.backend {
            Some(kind) => kind,
            None if self.bucket.is_some() => StorageBackendKind::S3,
            None => StorageBackendKind::Local,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: None,
            local_dir: default_local_dir(),
            bucket: None,
            region: None,
            access_key_id: None,
            secret_access_key: None,
            endpoint: None,
            download_url_ttl_secs: default_download_url_ttl(),
            probe_existence: false,
        }
    }
}

fn default_local_dir() -> String {
    "uploads".to_string()
}

fn default_download_url_ttl() -> u64 {
    600 // 10 minutes
}

/// Public URL resolution configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublicUrlSettings {
    /// Fixed public base URL. Takes precedence over everything else.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Derive the base URL from `X-Forwarded-*` headers.
    #[serde(default)]
    pub trust_proxy_headers: bool,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    /// Allowed origin, `*` for any.
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origin: default_allowed_origin(),
        }
    }
}

fn default_allowed_origin() -> String {
    "*".to_string()
}

/// Upload endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadSettings {
    /// Multipart field carrying the file.
    #[serde(default = "default_field_name")]
    pub field_name: String,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            field_name: default_field_name(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_field_name() -> String {
    "pdf".to_string()
}

fn default_max_body_bytes() -> usize {
    25 * 1024 * 1024
}

/// Plain environment variables from earlier deployments, mapped to config keys.
const LEGACY_ENV: [(&str, &str); 6] = [
    ("PORT", "server.port"),
    ("SERVER_DOMAIN", "public_url.base_url"),
    ("AWS_BUCKET_NAME", "storage.bucket"),
    ("AWS_REGION", "storage.region"),
    ("AWS_ACCESS_KEY_ID", "storage.access_key_id"),
    ("AWS_SECRET_ACCESS_KEY", "storage.secret_access_key"),
];

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, lowest precedence first: `config/default`, `config/{RUN_MODE}`,
    /// `DOCDROP__*` variables, then the legacy variables in [`LEGACY_ENV`].
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("DOCDROP").separator("__"));

        for (var, key) in LEGACY_ENV {
            let value = std::env::var(var).ok().filter(|v| !v.is_empty());
            builder = builder.set_override_option(key, value)?;
        }

        builder.build()?.try_deserialize()
    }
}
