//! Application setup and initialization
//!
//! All application initialization logic lives here rather than in main.rs so
//! integration tests can assemble the same router against test stores.

pub mod database;
pub mod routes;
pub mod server;

use crate::auth::{CredentialVerifier, LockoutTracker, MemoryLockoutStore, TokenService};
use crate::services::{RemoteCdn, UploadService};
use crate::state::AppState;
use anyhow::{Context, Result};
use atheneum_core::Config;
use atheneum_storage::{FileStorage, ImageKitClient, LocalStorage};
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    let store = database::setup_content_store(&config).await?;

    let storage: Arc<dyn FileStorage> = Arc::new(
        LocalStorage::new(&config.upload_dir)
            .await
            .context("Failed to initialize upload storage")?,
    );

    let cdn = match config.cdn {
        Some(ref cdn_config) => {
            let client = ImageKitClient::new(
                cdn_config.public_key.clone(),
                cdn_config.private_key.clone(),
                cdn_config.url_endpoint.clone(),
                cdn_config.timeout_secs,
            )
            .context("Failed to initialize CDN client")?;
            tracing::info!(url_endpoint = %cdn_config.url_endpoint, "CDN configured");
            Some(Arc::new(client))
        }
        None => {
            tracing::info!("CDN not configured, uploads will use local storage only");
            None
        }
    };

    // The password is hashed once here; only the hash stays in memory.
    let credentials = CredentialVerifier::new(&config.admin_password, config.max_password_length)
        .context("Failed to prepare admin credentials")?;

    let lockout = LockoutTracker::new(
        Arc::new(MemoryLockoutStore::new()),
        config.max_failed_attempts,
        config.lockout_window_secs,
    );
    lockout
        .clone()
        .spawn_sweeper(config.lockout_sweep_interval_secs);

    let tokens = Arc::new(TokenService::new(
        &config.jwt_secret,
        config.jwt_expiry_hours,
    ));

    let uploads = UploadService::new(
        store.clone(),
        storage.clone(),
        cdn.clone().map(|c| c as Arc<dyn RemoteCdn>),
        config.max_file_size_bytes,
        config.allowed_content_types.clone(),
    );

    let state = Arc::new(AppState {
        is_production: config.is_production(),
        store,
        storage,
        cdn,
        uploads,
        credentials,
        lockout,
        tokens,
        config,
    });

    let router = routes::setup_routes(&state.config, state.clone())?;

    Ok((state, router))
}
