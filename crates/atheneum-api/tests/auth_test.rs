//! Login, lockout, and token gate integration tests.

mod helpers;

use axum::http::StatusCode;
use helpers::{bearer, login, setup_test_app, TEST_JWT_SECRET, TEST_PASSWORD};
use serde_json::{json, Value};

#[tokio::test]
async fn test_login_with_correct_password_returns_token() {
    let app = setup_test_app().await;

    let response = app
        .server
        .post("/api/admin/login")
        .json(&json!({ "password": TEST_PASSWORD }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["token"].as_str().is_some());
    assert_eq!(body["expiresIn"], "24h");
    assert!(body["loginTime"].as_str().is_some());
}

#[tokio::test]
async fn test_login_response_is_not_cacheable() {
    let app = setup_test_app().await;

    let response = app
        .server
        .post("/api/admin/login")
        .json(&json!({ "password": TEST_PASSWORD }))
        .await;

    assert_eq!(
        response.headers().get("cache-control").unwrap(),
        "no-store"
    );
}

#[tokio::test]
async fn test_login_with_wrong_password_returns_invalid_credentials() {
    let app = setup_test_app().await;

    let response = app
        .server
        .post("/api/admin/login")
        .json(&json!({ "password": "nope" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_login_with_non_string_password_is_format_error() {
    let app = setup_test_app().await;

    let response = app
        .server
        .post("/api/admin/login")
        .json(&json!({ "password": 12345 }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_FORMAT");
}

#[tokio::test]
async fn test_login_with_overlong_password_is_format_error() {
    let app = setup_test_app().await;

    let response = app
        .server
        .post("/api/admin/login")
        .json(&json!({ "password": "x".repeat(101) }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_FORMAT");
}

#[tokio::test]
async fn test_lockout_after_five_failures_even_with_correct_password() {
    let app = setup_test_app().await;

    for _ in 0..5 {
        let response = app
            .server
            .post("/api/admin/login")
            .add_header("x-forwarded-for", "203.0.113.7")
            .json(&json!({ "password": "wrong" }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    // Sixth attempt is rejected before verification, correct password or not
    let response = app
        .server
        .post("/api/admin/login")
        .add_header("x-forwarded-for", "203.0.113.7")
        .json(&json!({ "password": TEST_PASSWORD }))
        .await;

    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    let body: Value = response.json();
    assert_eq!(body["code"], "ACCOUNT_LOCKED");
}

#[tokio::test]
async fn test_lockout_is_per_client() {
    let app = setup_test_app().await;

    for _ in 0..5 {
        app.server
            .post("/api/admin/login")
            .add_header("x-forwarded-for", "203.0.113.8")
            .json(&json!({ "password": "wrong" }))
            .await;
    }

    // A different client is unaffected
    let response = app
        .server
        .post("/api/admin/login")
        .add_header("x-forwarded-for", "203.0.113.9")
        .json(&json!({ "password": TEST_PASSWORD }))
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_successful_login_clears_failure_count() {
    let app = setup_test_app().await;

    for _ in 0..4 {
        app.server
            .post("/api/admin/login")
            .add_header("x-forwarded-for", "203.0.113.10")
            .json(&json!({ "password": "wrong" }))
            .await;
    }

    // Success resets the counter...
    app.server
        .post("/api/admin/login")
        .add_header("x-forwarded-for", "203.0.113.10")
        .json(&json!({ "password": TEST_PASSWORD }))
        .await
        .assert_status_ok();

    // ...so four more failures still do not lock
    for _ in 0..4 {
        app.server
            .post("/api/admin/login")
            .add_header("x-forwarded-for", "203.0.113.10")
            .json(&json!({ "password": "wrong" }))
            .await;
    }
    let response = app
        .server
        .post("/api/admin/login")
        .add_header("x-forwarded-for", "203.0.113.10")
        .json(&json!({ "password": TEST_PASSWORD }))
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_mutation_without_token_is_rejected() {
    let app = setup_test_app().await;

    let response = app
        .server
        .post("/api/algorithms")
        .json(&json!({ "title": "X", "description": "Y" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["code"], "NO_TOKEN");
}

#[tokio::test]
async fn test_mutation_with_malformed_header_is_rejected() {
    let app = setup_test_app().await;

    let response = app
        .server
        .post("/api/algorithms")
        .add_header("Authorization", "Token abc123")
        .json(&json!({ "title": "X", "description": "Y" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["code"], "NO_TOKEN");
}

#[tokio::test]
async fn test_mutation_with_garbage_token_is_rejected() {
    let app = setup_test_app().await;

    let response = app
        .server
        .post("/api/algorithms")
        .add_header("Authorization", bearer("not-a-real-token"))
        .json(&json!({ "title": "X", "description": "Y" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_stale_token_is_rejected_as_expired() {
    use atheneum_api::auth::{AdminClaims, Role};
    use jsonwebtoken::{encode, EncodingKey, Header};

    let app = setup_test_app().await;

    // Forge a token issued 25 hours ago but with a generous exp, so only the
    // independent issued-at age check can reject it.
    let iat = chrono::Utc::now().timestamp() - 25 * 3600;
    let claims = AdminClaims {
        sub: "admin".to_string(),
        role: Role::Admin,
        iat,
        exp: chrono::Utc::now().timestamp() + 3600,
        iss: "atheneum".to_string(),
        aud: "admin".to_string(),
        sid: "0".repeat(64),
        cip: None,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap();

    let response = app
        .server
        .post("/api/algorithms")
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "title": "X", "description": "Y" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["code"], "TOKEN_EXPIRED");
}

#[tokio::test]
async fn test_valid_token_passes_the_gate() {
    let app = setup_test_app().await;
    let token = login(&app).await;

    let response = app
        .server
        .post("/api/algorithms")
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "title": "X", "description": "Y" }))
        .await;

    response.assert_status(StatusCode::CREATED);
}
