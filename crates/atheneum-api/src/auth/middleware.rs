//! Bearer-token gate for privileged routes.
//!
//! Fails closed: no header (or a malformed one) is `NO_TOKEN`, a token that
//! does not validate is `INVALID_TOKEN`, and a token older than the max age
//! is `TOKEN_EXPIRED`. On success the decoded claims are attached to the
//! request as an [`AdminContext`] and the request continues.

use crate::auth::models::{AdminContext, Role};
use crate::auth::token::TokenService;
use crate::error::HttpAppError;
use crate::utils::ip::{client_id, trusted_proxy_count};
use atheneum_core::AuthError;
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;

const BEARER_PREFIX: &str = "Bearer ";

/// State handed to the auth middleware.
#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<TokenService>,
}

pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let socket_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let client_ip = client_id(request.headers(), socket_addr, trusted_proxy_count());

    let auth_header = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header.and_then(|h| h.strip_prefix(BEARER_PREFIX)) {
        Some(token) if !token.is_empty() => token,
        _ => {
            tracing::debug!(client_ip = %client_ip, "Request without bearer token rejected");
            return HttpAppError::from(AuthError::NoToken).into_response();
        }
    };

    let claims = match auth_state.tokens.validate(token) {
        Ok(claims) => claims,
        Err(err) => {
            tracing::debug!(client_ip = %client_ip, code = err.code(), "Token rejected");
            return HttpAppError::from(err).into_response();
        }
    };

    let context = AdminContext {
        role: Role::Admin,
        session_id: claims.sid.clone(),
        login_time: claims.login_time(),
    };
    request.extensions_mut().insert(context);
    next.run(request).await
}
