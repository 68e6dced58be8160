//! Token and password service ports.

use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Permission, Principal, Role};

/// Claims carried by a verified access token.
#[derive(Debug, Clone)]
pub struct AccessClaims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: Uuid,
}

/// A freshly minted refresh token. The raw token is handed to the client
/// exactly once; callers persist only its one-way hash.
#[derive(Debug, Clone)]
pub struct RefreshTokenParts {
    pub token: String,
    pub jti: Uuid,
}

/// Persisted refresh-token state. Never contains the raw token.
#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    pub jti: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Token service: signs and verifies access tokens, mints opaque refresh
/// tokens. Owns no state beyond a secret and the clock.
pub trait TokenService: Send + Sync {
    fn issue_access_token(&self, principal: &Principal) -> Result<String, AuthError>;

    fn issue_refresh_token(&self) -> RefreshTokenParts;

    /// Signature check plus explicit issuer/audience/expiry validation.
    /// Every failure collapses to `AuthError::InvalidToken`; the reason is
    /// never surfaced to the caller.
    fn verify_access_token(&self, token: &str) -> Result<AccessClaims, AuthError>;

    fn hash_opaque_token(&self, token: &str) -> String;

    fn verify_opaque_token_hash(&self, token: &str, digest: &str) -> bool;

    fn access_ttl(&self) -> Duration;

    fn refresh_ttl(&self) -> Duration;
}

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Authentication and authorization failures. The `Display` strings are the
/// exact denial reasons returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("No access token provided")]
    NoToken,

    /// Malformed, expired, bad signature, or foreign issuer/audience.
    /// Deliberately carries no detail about which.
    #[error("Invalid or expired access token")]
    InvalidToken,

    #[error("Token has been revoked")]
    Revoked,

    #[error("User not found")]
    UnknownPrincipal,

    #[error("Account is locked")]
    LockedAccount,

    #[error("Access denied")]
    PolicyDenied { missing: Vec<Permission> },

    #[error("Hashing error: {0}")]
    Hashing(String),
}

impl AuthError {
    /// HTTP status for this failure: 403 for policy denials, 401 otherwise.
    pub fn status(&self) -> u16 {
        match self {
            Self::PolicyDenied { .. } => 403,
            Self::Hashing(_) => 500,
            _ => 401,
        }
    }
}
