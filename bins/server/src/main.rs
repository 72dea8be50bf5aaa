//! Docdrop API Server
//!
//! Main entry point for the document drop service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docdrop_api::{AppState, cors_layer, create_router};
use docdrop_core::storage::{StorageConfig, connect};
use docdrop_core::transfer::{DownloadPipeline, UploadPipeline};
use docdrop_core::url_resolver::{RequestContext, UrlResolutionStrategy, UrlResolver};
use docdrop_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docdrop=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Connect storage backend
    let storage_config = StorageConfig::from_settings(&config.storage)
        .context("Invalid storage configuration")?;
    let storage = connect(&storage_config)
        .await
        .context("Failed to initialise storage backend")?;
    info!(
        backend = storage.kind(),
        provider = storage_config.provider.name(),
        "Storage backend ready"
    );

    // Public URL strategy
    let strategy = UrlResolutionStrategy::from_settings(&config.public_url, config.server.port)
        .context("Invalid public URL configuration")?;
    info!(strategy = strategy.name(), "Public URL strategy selected");
    let resolver = UrlResolver::new(strategy);
    let base = resolver.resolve(&RequestContext::default());

    // Create application state
    let state = AppState {
        uploads: Arc::new(UploadPipeline::new(storage.clone(), resolver)),
        downloads: Arc::new(DownloadPipeline::new(storage)),
        upload_field: Arc::from(config.upload.field_name.as_str()),
    };

    // Create router
    let cors = cors_layer(&config.cors).context("Invalid CORS origin")?;
    let app = create_router(state, cors, config.upload.max_body_bytes);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "Server listening");
    info!("Server running at {base}");

    axum::serve(listener, app).await?;

    Ok(())
}
