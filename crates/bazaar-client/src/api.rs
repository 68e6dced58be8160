//! Client-side ports onto the HTTP API.

use async_trait::async_trait;

use bazaar_core::domain::{Item, Principal};

/// Client-side request failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("rejected: {0}")]
    Rejected(String),

    #[error("request timed out")]
    Timeout,
}

/// A successful login: the resolved principal plus both tokens. The raw
/// refresh token appears here once and is never re-readable from the server.
#[derive(Debug, Clone)]
pub struct LoginSession {
    pub principal: Principal,
    pub access_token: String,
    pub refresh_token: String,
}

/// The auth endpoints.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<LoginSession, ClientError>;

    async fn refresh(&self, refresh_token: &str) -> Result<String, ClientError>;

    async fn logout(&self, access_token: &str) -> Result<(), ClientError>;
}

/// One guarded item list (cart or wishlist) on the server.
///
/// `add` is idempotent on the line's identity key; re-sending an existing
/// line never creates a duplicate.
#[async_trait]
pub trait ItemsApi: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Item>, ClientError>;

    async fn add(&self, item: &Item) -> Result<(), ClientError>;
}
