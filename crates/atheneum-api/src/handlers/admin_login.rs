//! Admin login: the only credential-bearing endpoint.
//!
//! The lockout check runs before password verification so a locked-out
//! client never pays the hashing cost; failed attempts are answered after a
//! deliberate delay to slow online guessing.

use crate::error::HttpAppError;
use crate::state::AppState;
use crate::utils::ip::ClientId;
use atheneum_core::AuthError;
use axum::{extract::State, http::header, response::IntoResponse, Json};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Deserialized loosely so a non-string password yields the
    /// INVALID_FORMAT code instead of a generic body rejection.
    #[serde(default)]
    password: serde_json::Value,
}

pub async fn admin_login(
    State(state): State<Arc<AppState>>,
    ClientId(client): ClientId,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let Some(password) = body.password.as_str() else {
        return Err(AuthError::InvalidFormat.into());
    };

    if state.lockout.is_locked_out(&client).await {
        tracing::warn!(client_id = %client, "Login rejected: client is locked out");
        return Err(AuthError::AccountLocked.into());
    }

    let valid = state.credentials.verify(password)?;
    if !valid {
        state.lockout.record_failure(&client).await;

        // Slow down online guessing
        let delay = state.config.failed_login_delay_ms;
        if delay > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        }

        tracing::info!(client_id = %client, "Login failed: invalid credentials");
        return Err(AuthError::InvalidCredentials.into());
    }

    state.lockout.clear(&client).await;

    let issued = state.tokens.issue(Some(&client))?;
    tracing::info!(client_id = %client, "Admin login successful");

    Ok((
        [(header::CACHE_CONTROL, "no-store")],
        Json(serde_json::json!({
            "token": issued.token,
            "expiresIn": format!("{}h", issued.expires_in_hours),
            "loginTime": issued.login_time.to_rfc3339(),
        })),
    ))
}
