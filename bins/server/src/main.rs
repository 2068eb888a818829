//! Kindred upload API server
//!
//! Serves the ingest and removal endpoints of the admin panel.

use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kindred_api::{AppState, MEDIA_MOUNT, create_router};
use kindred_core::media::MediaService;
use kindred_core::storage::{StorageConfig, StorageProvider, StorageService};
use kindred_shared::config::load_layered;
use kindred_shared::{AppConfig, JwtConfig, JwtService};

/// The `[storage]` section, read only by the server.
#[derive(Debug, Deserialize)]
struct StorageSection {
    storage: StorageConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kindred=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let StorageSection { storage } =
        load_layered().context("Failed to load storage configuration")?;

    let media_root = match &storage.provider {
        StorageProvider::LocalFs { root } => Some(root.clone()),
        _ => None,
    };
    let storage = StorageService::from_config(storage)
        .context("Failed to initialize storage provider")?;
    info!(
        provider = storage.provider_name(),
        public_base_url = %storage.config().public_base_url,
        "Storage provider configured"
    );

    if media_root.is_some()
        && !storage
            .config()
            .public_base_url
            .trim_end_matches('/')
            .ends_with(MEDIA_MOUNT)
    {
        warn!(
            mount = MEDIA_MOUNT,
            "public_base_url does not point at the local media mount"
        );
    }

    let jwt_service = JwtService::new(JwtConfig::from(&config.jwt));
    let media = MediaService::new(Arc::new(storage), config.upload);
    info!(
        max_size = media.settings().max_size,
        max_files = media.settings().max_files,
        folder = %media.settings().default_folder,
        "Upload limits configured"
    );

    let mut state = AppState::new(Arc::new(jwt_service), Arc::new(media));
    if let Some(root) = media_root {
        info!(root = %root.display(), mount = MEDIA_MOUNT, "Serving local media");
        state = state.with_media_root(root);
    }
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
