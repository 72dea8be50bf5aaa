//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod download;
pub mod health;
pub mod upload;

/// Creates the API router with all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(upload::routes())
        .merge(download::routes())
}
