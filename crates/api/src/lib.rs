//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - Upload, download and health routes
//! - Request extractors
//! - Error responses

pub mod error;
pub mod extractors;
pub mod routes;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header::CONTENT_TYPE, header::InvalidHeaderValue},
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use docdrop_core::transfer::{DownloadPipeline, UploadPipeline};
use docdrop_shared::config::CorsSettings;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Upload pipeline.
    pub uploads: Arc<UploadPipeline>,
    /// Download pipeline.
    pub downloads: Arc<DownloadPipeline>,
    /// Multipart field carrying the uploaded file.
    pub upload_field: Arc<str>,
}

/// Builds the CORS layer from settings. `*` allows any origin.
///
/// # Errors
///
/// Returns an error if the configured origin is not a valid header value.
pub fn cors_layer(settings: &CorsSettings) -> Result<CorsLayer, InvalidHeaderValue> {
    let origin = match settings.allowed_origin.trim() {
        "*" => AllowOrigin::from(Any),
        origin => AllowOrigin::exact(HeaderValue::from_str(origin)?),
    };

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]))
}

/// Creates the main application router.
pub fn create_router(state: AppState, cors: CorsLayer, max_body_bytes: usize) -> Router {
    routes::routes()
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
