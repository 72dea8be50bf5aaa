//! Storage error types.

use std::fmt::Display;

use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No object stored under the key.
    #[error("file not found: {key}")]
    NotFound {
        /// Storage key that was not found.
        key: String,
    },

    /// Key contains characters no issued key can contain.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    /// Medium unreachable, full, or rejected the write.
    #[error("storage write failed: {0}")]
    Write(String),

    /// Medium failed while locating or reading an object.
    #[error("storage read failed: {0}")]
    Read(String),

    /// Signing a download URL failed.
    #[error("presign failed: {0}")]
    Presign(String),

    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),
}

impl StorageError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create an invalid key error.
    #[must_use]
    pub fn invalid_key(key: impl Into<String>) -> Self {
        Self::InvalidKey(key.into())
    }

    /// Create a write error.
    #[must_use]
    pub fn write(err: impl Display) -> Self {
        Self::Write(err.to_string())
    }

    /// Create a read error.
    #[must_use]
    pub fn read(err: impl Display) -> Self {
        Self::Read(err.to_string())
    }

    /// Create a presign error.
    #[must_use]
    pub fn presign(err: impl Display) -> Self {
        Self::Presign(err.to_string())
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}
