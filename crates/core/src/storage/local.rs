//! Flat-directory backend.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use super::backend::{ObjectStream, ResolvedLocation, StorageBackend};
use super::error::StorageError;
use crate::identity::{is_valid_key, original_name};

/// Stores each object as one file named by its key.
#[derive(Debug, Clone)]
pub struct LocalDisk {
    root: PathBuf,
}

impl LocalDisk {
    /// Open the backend, creating the directory if absent.
    ///
    /// Safe to race: an already existing directory is not an error.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the directory cannot be created.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            StorageError::configuration(format!(
                "cannot create upload directory {}: {e}",
                root.display()
            ))
        })?;
        Ok(Self { root })
    }

    /// The upload directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        if !is_valid_key(key) {
            return Err(StorageError::invalid_key(key));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl StorageBackend for LocalDisk {
    fn kind(&self) -> &'static str {
        "local"
    }

    async fn put(&self, key: &str, bytes: Bytes, _content_type: &str) -> Result<(), StorageError> {
        let path = self.object_path(key)?;

        // create_new keeps objects write-once.
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| StorageError::write(format!("{key}: {e}")))?;

        let written = async {
            file.write_all(&bytes).await?;
            file.flush().await
        }
        .await;

        if let Err(e) = written {
            drop(file);
            if let Err(cleanup) = tokio::fs::remove_file(&path).await {
                warn!(key, error = %cleanup, "Failed to remove partial upload");
            }
            return Err(StorageError::write(format!("{key}: {e}")));
        }

        debug!(key, size_bytes = bytes.len(), "Object written to disk");
        Ok(())
    }

    async fn resolve(&self, key: &str) -> Result<ResolvedLocation, StorageError> {
        let path = self.object_path(key)?;

        let file = match File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::not_found(key));
            }
            Err(e) => return Err(StorageError::read(format!("{key}: {e}"))),
        };

        let metadata = file
            .metadata()
            .await
            .map_err(|e| StorageError::read(format!("{key}: {e}")))?;
        if !metadata.is_file() {
            return Err(StorageError::not_found(key));
        }

        let content_type = mime_guess::from_path(&path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Ok(ResolvedLocation::DirectStream(ObjectStream {
            file_name: original_name(key).into_owned(),
            content_type,
            content_length: metadata.len(),
            body: ReaderStream::new(file).boxed(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    async fn read_all(location: ResolvedLocation) -> (ObjectStream, Vec<u8>) {
        let ResolvedLocation::DirectStream(mut stream) = location else {
            panic!("local disk should stream");
        };
        let body = std::mem::replace(&mut stream.body, futures::stream::empty().boxed());
        let bytes: Vec<u8> = body
            .map_ok(|chunk| chunk.to_vec())
            .try_concat()
            .await
            .expect("should read body");
        (stream, bytes)
    }

    #[tokio::test]
    async fn test_open_creates_directory_idempotently() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("nested").join("uploads");

        let (a, b) = tokio::join!(LocalDisk::open(&root), LocalDisk::open(&root));
        assert!(a.is_ok());
        assert!(b.is_ok());
        assert!(root.is_dir());

        assert!(LocalDisk::open(&root).await.is_ok());
    }

    #[tokio::test]
    async fn test_put_then_resolve_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let disk = LocalDisk::open(dir.path()).await.expect("open");

        disk.put(
            "1700000000000-a.pdf",
            Bytes::from_static(b"0123456789"),
            "application/pdf",
        )
        .await
        .expect("put");

        let location = disk.resolve("1700000000000-a.pdf").await.expect("resolve");
        let (stream, bytes) = read_all(location).await;
        assert_eq!(bytes, b"0123456789");
        assert_eq!(stream.file_name, "a.pdf");
        assert_eq!(stream.content_type, "application/pdf");
        assert_eq!(stream.content_length, 10);
    }

    #[tokio::test]
    async fn test_resolve_offers_name_as_uploaded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let disk = LocalDisk::open(dir.path()).await.expect("open");
        let generator = crate::identity::IdentityGenerator::new();

        for name in ["my report.pdf", "résumé.pdf"] {
            let key = generator.assign(name);
            disk.put(&key, Bytes::from_static(b"x"), "application/pdf")
                .await
                .expect("put");

            let (stream, _) = read_all(disk.resolve(&key).await.expect("resolve")).await;
            assert_eq!(stream.file_name, name);
            assert_eq!(stream.content_type, "application/pdf");
        }
    }

    #[tokio::test]
    async fn test_resolve_unknown_key_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let disk = LocalDisk::open(dir.path()).await.expect("open");

        let err = disk.resolve("unknown-key").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { key } if key == "unknown-key"));
    }

    #[tokio::test]
    async fn test_put_is_write_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let disk = LocalDisk::open(dir.path()).await.expect("open");

        disk.put("1-a.txt", Bytes::from_static(b"first"), "text/plain")
            .await
            .expect("first put");
        let err = disk
            .put("1-a.txt", Bytes::from_static(b"second"), "text/plain")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Write(_)));

        let (_, bytes) = read_all(disk.resolve("1-a.txt").await.expect("resolve")).await;
        assert_eq!(bytes, b"first");
    }

    #[tokio::test]
    async fn test_traversal_keys_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let disk = LocalDisk::open(dir.path().join("uploads"))
            .await
            .expect("open");

        for key in ["../escape.pdf", "..", "a/b.pdf", ""] {
            assert!(matches!(
                disk.put(key, Bytes::from_static(b"x"), "text/plain").await,
                Err(StorageError::InvalidKey(_))
            ));
            assert!(matches!(
                disk.resolve(key).await,
                Err(StorageError::InvalidKey(_))
            ));
        }
        assert!(!dir.path().join("escape.pdf").exists());
    }

    #[tokio::test]
    async fn test_put_into_missing_directory_fails_as_write_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let disk = LocalDisk::open(dir.path().join("gone")).await.expect("open");
        std::fs::remove_dir(disk.root()).expect("remove upload dir");

        let err = disk
            .put("1-a.pdf", Bytes::from_static(b"x"), "application/pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Write(_)));
    }

    #[tokio::test]
    async fn test_unknown_extension_is_octet_stream() {
        let dir = tempfile::tempdir().expect("tempdir");
        let disk = LocalDisk::open(dir.path()).await.expect("open");
        disk.put("1-blob", Bytes::from_static(b"x"), "application/x-custom")
            .await
            .expect("put");

        let (stream, _) = read_all(disk.resolve("1-blob").await.expect("resolve")).await;
        assert_eq!(stream.content_type, "application/octet-stream");
    }
}
