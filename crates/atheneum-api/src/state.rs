//! Application state.
//!
//! One aggregate handed to handlers as `Arc<AppState>`. The content store and
//! file storage are trait objects so the memory/relational and local/CDN
//! choices stay startup configuration, invisible to handlers.

use crate::auth::{CredentialVerifier, LockoutTracker, TokenService};
use crate::services::UploadService;
use atheneum_core::Config;
use atheneum_db::ContentStore;
use atheneum_storage::{FileStorage, ImageKitClient};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ContentStore>,
    pub storage: Arc<dyn FileStorage>,
    /// Present iff all CDN environment variables were provided.
    pub cdn: Option<Arc<ImageKitClient>>,
    pub uploads: UploadService,
    pub credentials: CredentialVerifier,
    pub lockout: LockoutTracker,
    pub tokens: Arc<TokenService>,
    pub is_production: bool,
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
