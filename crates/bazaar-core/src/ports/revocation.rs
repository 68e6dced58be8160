//! Token revocation port.

use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

/// Maps a token identifier (`jti`) to a revoked flag with expiry.
/// Pluggable: in-memory set, Redis, or any external cache.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Mark a token as revoked until its natural expiry.
    async fn revoke(&self, jti: Uuid, ttl: Duration) -> Result<(), RevocationError>;

    async fn is_revoked(&self, jti: Uuid) -> Result<bool, RevocationError>;
}

/// Revocation store errors.
#[derive(Debug, thiserror::Error)]
pub enum RevocationError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}
