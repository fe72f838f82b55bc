use crate::error::ErrorResponse;
use atheneum_core::AuthError;
use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Requester role for authorization.
///
/// There is no role hierarchy: a request either proved possession of the
/// admin password or it is anonymous.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Anonymous,
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Role::Anonymous => write!(f, "anonymous"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// Admin context extracted from a validated token and stored in request
/// extensions by the auth middleware.
#[derive(Debug, Clone)]
pub struct AdminContext {
    pub role: Role,
    pub session_id: String,
    pub login_time: DateTime<Utc>,
}

// Implement FromRequestParts for AdminContext so handlers can take it as an
// argument even alongside Multipart (Extension cannot be combined with it).
impl<S> FromRequestParts<S> for AdminContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AdminContext>()
            .cloned()
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse {
                        error: "Access denied. No valid authentication token provided."
                            .to_string(),
                        details: None,
                        error_type: None,
                        code: AuthError::NoToken.code().to_string(),
                        recoverable: false,
                        suggested_action: Some("Login to obtain a token".to_string()),
                    }),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(
            serde_json::to_string(&Role::Anonymous).unwrap(),
            "\"anonymous\""
        );
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::Admin.to_string(), "admin");
        assert_eq!(Role::Anonymous.to_string(), "anonymous");
    }
}
