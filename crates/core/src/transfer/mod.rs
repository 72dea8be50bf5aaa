//! Upload and download orchestration.
//!
//! This module wires the leaf components together:
//! - Upload: key assignment, backend write, retrieval URL, QR encoding
//! - Download: key lookup and the stream-or-redirect decision

mod download;
mod error;
mod types;
mod upload;

pub use download::DownloadPipeline;
pub use error::{DownloadError, UploadError};
pub use types::{IncomingFile, UploadReceipt, UploadStage};
pub use upload::UploadPipeline;
