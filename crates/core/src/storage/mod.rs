//! Storage backends for uploaded documents.
//!
//! Two variants sit behind the [`StorageBackend`] trait, chosen once at startup:
//! - [`LocalDisk`]: a flat directory; downloads stream the bytes back directly
//! - [`ObjectStore`]: an S3-compatible bucket via Apache OpenDAL; downloads are
//!   answered with a time-limited presigned URL
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                   dyn StorageBackend                         │
//! ├──────────────────────────────┬───────────────────────────────┤
//! │ LocalDisk                    │ ObjectStore (OpenDAL S3)      │
//! │ put  -> create_new + write   │ put  -> op.write_with(..)     │
//! │ resolve -> DirectStream      │ resolve -> op.presign_read()  │
//! │          (404 when absent)   │   RedirectUrl, no stat        │
//! └──────────────────────────────┴───────────────────────────────┘
//! ```

mod backend;
mod config;
mod error;
mod local;
mod s3;

pub use backend::{
    ByteStream, ObjectStream, ResolvedLocation, SignedAccess, StorageBackend, StoredObject,
    connect,
};
pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use local::LocalDisk;
pub use s3::ObjectStore;
