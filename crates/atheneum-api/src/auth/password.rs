//! Admin credential verification.
//!
//! There is no user table; "admin" is whoever knows the single shared
//! password. The plaintext from the environment is hashed once at startup
//! and only the bcrypt hash is kept in memory.

use atheneum_core::{AppError, AuthError};

/// Checks a submitted password against the stored bcrypt hash.
///
/// The verifier is a pure check; attempt bookkeeping belongs to the
/// [`crate::auth::lockout::LockoutTracker`] wrapping it.
#[derive(Clone)]
pub struct CredentialVerifier {
    password_hash: String,
    max_length: usize,
}

impl std::fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVerifier").finish()
    }
}

impl CredentialVerifier {
    /// Hash the admin password with the default cost (tuned for ~100ms).
    pub fn new(plain_password: &str, max_length: usize) -> Result<Self, AppError> {
        Self::with_cost(plain_password, bcrypt::DEFAULT_COST, max_length)
    }

    /// Hash with an explicit cost factor; tests use a low cost.
    pub fn with_cost(
        plain_password: &str,
        cost: u32,
        max_length: usize,
    ) -> Result<Self, AppError> {
        let password_hash = bcrypt::hash(plain_password, cost)
            .map_err(|e| AppError::Internal(format!("Failed to hash admin password: {}", e)))?;
        Ok(Self {
            password_hash,
            max_length,
        })
    }

    /// Verify a candidate password.
    ///
    /// Length is bounded before any hashing so an attacker cannot buy CPU time
    /// with megabyte passwords; over-long or empty input is a format error,
    /// not a failed comparison.
    pub fn verify(&self, candidate: &str) -> Result<bool, AppError> {
        if candidate.is_empty() || candidate.len() > self.max_length {
            return Err(AuthError::InvalidFormat.into());
        }

        match bcrypt::verify(candidate, &self.password_hash) {
            Ok(matches) => Ok(matches),
            Err(e) => {
                tracing::error!(error = %e, "bcrypt verification failed");
                Ok(false)
            }
        }
    }
}
