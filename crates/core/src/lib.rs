//! Core logic for docdrop.
//!
//! This crate holds everything that does not depend on the web framework:
//! storage backends, key assignment, URL resolution, QR encoding and the
//! upload/download pipelines built on top of them.
//!
//! # Modules
//!
//! - `storage` - Local disk and S3-compatible object storage
//! - `identity` - Storage key assignment
//! - `url_resolver` - Public retrieval URL construction
//! - `codec` - QR code rendering
//! - `transfer` - Upload and download pipelines

pub mod codec;
pub mod identity;
pub mod storage;
pub mod transfer;
pub mod url_resolver;
