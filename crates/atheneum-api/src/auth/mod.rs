//! Authentication and authorization: credential verification, failed-login
//! lockout, token issuance/validation, and the bearer-token middleware.

pub mod lockout;
pub mod middleware;
pub mod models;
pub mod password;
pub mod token;

pub use lockout::{LockoutRecord, LockoutStore, LockoutTracker, MemoryLockoutStore};
pub use middleware::{auth_middleware, AuthState};
pub use models::{AdminContext, Role};
pub use password::CredentialVerifier;
pub use token::{AdminClaims, IssuedToken, TokenService};
