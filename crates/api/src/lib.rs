//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - The ingest and removal endpoints of the upload pipeline
//! - Session middleware resolving admin tokens
//! - The failure envelope shared by every route
//! - Static serving of locally stored media

pub mod error;
pub mod middleware;
pub mod routes;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use kindred_core::media::MediaService;
use kindred_shared::JwtService;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Path locally stored media is served under.
pub const MEDIA_MOUNT: &str = "/media";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// JWT service resolving admin sessions.
    pub jwt_service: Arc<JwtService>,
    /// Media service fronting the storage provider.
    pub media: Arc<MediaService>,
    /// Directory served at [`MEDIA_MOUNT`], set for the local filesystem provider.
    pub media_root: Option<PathBuf>,
}

impl AppState {
    /// Creates the state from its services.
    #[must_use]
    pub fn new(jwt_service: Arc<JwtService>, media: Arc<MediaService>) -> Self {
        Self {
            jwt_service,
            media,
            media_root: None,
        }
    }

    /// Serves files under `root` at [`MEDIA_MOUNT`].
    #[must_use]
    pub fn with_media_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.media_root = Some(root.into());
        self
    }
}

/// Creates the main application router.
///
/// The body limit leaves room for a full batch of maximum-size files.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.media.settings().request_body_limit();

    let mut router = Router::new().nest("/api", routes::api_routes_with_state(state.clone()));
    if let Some(root) = &state.media_root {
        router = router.nest_service(MEDIA_MOUNT, ServeDir::new(root));
    }

    router
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
