//! Session token issuance and validation.
//!
//! Stateless HS256 tokens: validity is purely a function of the signature and
//! the embedded timestamps, there is no revocation list. Issuer and audience
//! are bound into the signature to prevent cross-context replay.

use crate::auth::models::Role;
use atheneum_core::AuthError;
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};

const ISSUER: &str = "atheneum";
const AUDIENCE: &str = "admin";

/// Claims carried by an admin session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminClaims {
    pub sub: String,
    pub role: Role,
    /// Issued-at (seconds since epoch); also drives the independent age check.
    pub iat: i64,
    /// Expiry enforced by the JWT library.
    pub exp: i64,
    pub iss: String,
    pub aud: String,
    /// Random session identifier.
    pub sid: String,
    /// Client address hint captured at login.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cip: Option<String>,
}

impl AdminClaims {
    pub fn login_time(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.iat, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

/// A freshly issued token plus the metadata the login response reports.
#[derive(Debug)]
pub struct IssuedToken {
    pub token: String,
    pub login_time: DateTime<Utc>,
    pub expires_in_hours: i64,
}

/// Issues and validates admin session tokens.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_hours: i64,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &str, expiry_hours: i64) -> Self {
        let mut validation = Validation::default();
        validation.set_issuer(&[ISSUER]);
        validation.set_audience(&[AUDIENCE]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry_hours,
            validation,
        }
    }

    /// Issue a signed token for the admin role.
    pub fn issue(&self, client_ip: Option<&str>) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let claims = AdminClaims {
            sub: "admin".to_string(),
            role: Role::Admin,
            iat: now.timestamp(),
            exp: (now + chrono::Duration::hours(self.expiry_hours)).timestamp(),
            iss: ISSUER.to_string(),
            aud: AUDIENCE.to_string(),
            sid: generate_session_id(),
            cip: client_ip.map(|ip| ip.to_string()),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!(error = %e, "Failed to sign session token");
            AuthError::InvalidToken
        })?;

        Ok(IssuedToken {
            token,
            login_time: now,
            expires_in_hours: self.expiry_hours,
        })
    }

    /// Validate a token and return its claims.
    ///
    /// Signature, issuer, audience, and library expiry all collapse to
    /// `InvalidToken` (the reason is logged, never surfaced). On top of that,
    /// the issued-at age is checked independently of `exp` as defense in
    /// depth against clock skew, yielding the distinct `TokenExpired` code.
    pub fn validate(&self, token: &str) -> Result<AdminClaims, AuthError> {
        let data = decode::<AdminClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!(reason = %e, "Token verification failed");
                AuthError::InvalidToken
            })?;

        let claims = data.claims;
        let age_secs = Utc::now().timestamp() - claims.iat;
        if age_secs > self.expiry_hours * 3600 {
            tracing::debug!(age_secs = age_secs, "Token issued-at exceeds max age");
            return Err(AuthError::TokenExpired);
        }

        Ok(claims)
    }

    pub fn expiry_hours(&self) -> i64 {
        self.expiry_hours
    }
}

/// Generate a random session identifier (32 bytes, hex-encoded).
pub fn generate_session_id() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
