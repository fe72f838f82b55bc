//! Route configuration and setup.

use crate::auth::{auth_middleware, AuthState};
use crate::constants::MULTIPART_OVERHEAD_BYTES;
use crate::handlers::{
    admin_login, algorithms, content, download, files, imagekit, notes, projects,
};
use crate::middleware::{rate_limit_middleware, security_headers_middleware, HttpRateLimiter};
use crate::state::AppState;
use anyhow::Result;
use atheneum_core::Config;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Interval for dropping expired rate-limit buckets.
const RATE_LIMIT_CLEANUP_INTERVAL_SECS: u64 = 300;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>> {
    let cors = setup_cors(config)?;
    let auth_state = Arc::new(AuthState {
        tokens: state.tokens.clone(),
    });

    // General request limiter plus a stricter one dedicated to login. Both
    // run before any auth logic.
    let general_limiter = Arc::new(HttpRateLimiter::new(
        config.rate_limit_max_requests,
        config.rate_limit_window_secs,
    ));
    let login_limiter = Arc::new(HttpRateLimiter::new(
        config.login_rate_limit_max_requests,
        config.rate_limit_window_secs,
    ));
    general_limiter
        .clone()
        .spawn_cleanup(RATE_LIMIT_CLEANUP_INTERVAL_SECS);
    login_limiter
        .clone()
        .spawn_cleanup(RATE_LIMIT_CLEANUP_INTERVAL_SECS);

    let login_routes = Router::new()
        .route("/api/admin/login", post(admin_login::admin_login))
        .layer(axum::middleware::from_fn_with_state(
            login_limiter,
            rate_limit_middleware,
        ));

    let public_routes = Router::new()
        .route("/api/algorithms", get(algorithms::list_algorithms))
        .route("/api/algorithms/{id}", get(algorithms::get_algorithm))
        .route("/api/algorithm-content", get(content::list_all_content))
        .route("/api/algorithms/{id}/content", get(content::list_content))
        .route("/api/projects", get(projects::list_projects))
        .route("/api/files", get(files::list_files))
        .route("/api/algorithms/{id}/notes", get(notes::list_notes))
        .route("/api/download/{file_id}", get(download::download_file))
        .route("/uploads/{stored_name}", get(download::serve_upload))
        .route("/api/imagekit/optimize/{*path}", get(imagekit::cdn_optimize));

    let protected_routes = Router::new()
        .route("/api/algorithms", post(algorithms::create_algorithm))
        .route("/api/algorithms/{id}", delete(algorithms::delete_algorithm))
        .route("/api/algorithms/{id}/content", post(content::upload_content))
        .route("/api/content/{id}", delete(content::delete_content))
        .route("/api/projects", post(projects::create_project))
        .route("/api/projects/{id}", delete(projects::delete_project))
        .route("/api/files", post(files::upload_file))
        .route("/api/files/{id}", delete(files::delete_file))
        .route(
            "/api/files/category/{category}",
            delete(files::delete_files_by_category),
        )
        .route("/api/algorithms/{id}/notes", post(notes::create_note))
        .route("/api/notes/{id}", put(notes::update_note))
        .route("/api/notes/{id}", delete(notes::delete_note))
        .route("/api/imagekit/auth", get(imagekit::cdn_auth))
        .route("/api/imagekit/upload", post(imagekit::cdn_upload))
        .route("/api/imagekit/files", get(imagekit::cdn_list_files))
        .route("/api/imagekit/{file_id}", delete(imagekit::cdn_delete))
        .route_layer(axum::middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ));

    let app = login_routes
        .merge(public_routes)
        .merge(protected_routes)
        .layer(RequestBodyLimitLayer::new(
            config.max_file_size_bytes + MULTIPART_OVERHEAD_BYTES,
        ))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(axum::middleware::from_fn_with_state(
            general_limiter,
            rate_limit_middleware,
        ))
        .with_state(state);

    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer> {
    if config.cors_origins.is_empty() || config.cors_origins.iter().any(|o| o == "*") {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    let origins = config
        .cors_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|e| anyhow::anyhow!("Invalid CORS origin '{}': {}", origin, e))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any))
}
