#![allow(dead_code)] // each test binary uses a different subset of helpers

//! Test helpers: build AppState and router for integration tests.
//!
//! Tests run the real router against the in-memory content store and a
//! temp-dir local storage, so no external services are needed. Distinct
//! clients are simulated via `X-Forwarded-For` (the app trusts one proxy hop
//! by default).

use atheneum_api::auth::{CredentialVerifier, LockoutTracker, MemoryLockoutStore, TokenService};
use atheneum_api::services::UploadService;
use atheneum_api::setup::routes::setup_routes;
use atheneum_api::state::AppState;
use atheneum_core::Config;
use atheneum_db::{ContentStore, MemoryStore};
use atheneum_storage::{FileStorage, LocalStorage};
use axum_test::TestServer;
use std::sync::Arc;
use tempfile::TempDir;

pub const TEST_PASSWORD: &str = "correct horse battery staple";
pub const TEST_JWT_SECRET: &str = "integration-test-secret-0123456789abcdef";

/// bcrypt minimum cost; keeps login tests fast.
const TEST_BCRYPT_COST: u32 = 4;

pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub _temp_dir: TempDir,
}

impl TestApp {
    /// Number of files currently in the uploads directory.
    pub fn files_on_disk(&self) -> usize {
        std::fs::read_dir(self._temp_dir.path()).unwrap().count()
    }
}

pub fn test_config() -> Config {
    Config {
        server_port: 0,
        environment: "test".to_string(),
        cors_origins: vec![],
        database_url: None,
        admin_password: TEST_PASSWORD.to_string(),
        jwt_secret: TEST_JWT_SECRET.to_string(),
        session_secret: None,
        jwt_expiry_hours: 24,
        max_password_length: 100,
        max_failed_attempts: 5,
        lockout_window_secs: 900,
        lockout_sweep_interval_secs: 3600,
        failed_login_delay_ms: 0,
        rate_limit_window_secs: 900,
        rate_limit_max_requests: 10_000,
        login_rate_limit_max_requests: 100,
        upload_dir: "uploads".to_string(),
        max_file_size_bytes: 1024 * 1024,
        allowed_content_types: vec![
            "image/png".to_string(),
            "image/jpeg".to_string(),
            "application/pdf".to_string(),
            "video/mp4".to_string(),
        ],
        cdn: None,
    }
}

/// Setup a test app over the in-memory store and temp-dir storage.
pub async fn setup_test_app() -> TestApp {
    let config = test_config();
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");

    let store: Arc<dyn ContentStore> = Arc::new(MemoryStore::new());
    let storage: Arc<dyn FileStorage> = Arc::new(
        LocalStorage::new(temp_dir.path())
            .await
            .expect("Failed to create local storage"),
    );

    let credentials = CredentialVerifier::with_cost(
        &config.admin_password,
        TEST_BCRYPT_COST,
        config.max_password_length,
    )
    .expect("Failed to hash test password");

    let lockout = LockoutTracker::new(
        Arc::new(MemoryLockoutStore::new()),
        config.max_failed_attempts,
        config.lockout_window_secs,
    );

    let tokens = Arc::new(TokenService::new(
        &config.jwt_secret,
        config.jwt_expiry_hours,
    ));

    let uploads = UploadService::new(
        store.clone(),
        storage.clone(),
        None,
        config.max_file_size_bytes,
        config.allowed_content_types.clone(),
    );

    let state = Arc::new(AppState {
        is_production: false,
        store,
        storage,
        cdn: None,
        uploads,
        credentials,
        lockout,
        tokens,
        config,
    });

    let router = setup_routes(&state.config, state.clone()).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp {
        server,
        state,
        _temp_dir: temp_dir,
    }
}

/// Login with the test password and return the bearer token.
pub async fn login(app: &TestApp) -> String {
    let response = app
        .server
        .post("/api/admin/login")
        .json(&serde_json::json!({ "password": TEST_PASSWORD }))
        .await;
    response.assert_status_ok();
    response.json::<serde_json::Value>()["token"]
        .as_str()
        .expect("login response carries a token")
        .to_string()
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
