//! Redis-backed revocation store.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use uuid::Uuid;

use bazaar_core::ports::{RevocationError, RevocationStore};

/// Redis connection configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis URL (e.g., redis://localhost:6379)
    pub url: String,
    /// Connection timeout
    pub connect_timeout: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl RedisConfig {
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            connect_timeout: Duration::from_secs(
                std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
        }
    }
}

/// Revoked jtis as `revoked:<jti>` keys with Redis-side expiry, shared by
/// every server instance.
pub struct RedisRevocationStore {
    conn: ConnectionManager,
}

impl RedisRevocationStore {
    pub async fn new(config: RedisConfig) -> Result<Self, RevocationError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| RevocationError::Connection(e.to_string()))?;

        let conn = tokio::time::timeout(config.connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| RevocationError::Connection("Connection timed out".to_string()))?
            .map_err(|e| RevocationError::Connection(e.to_string()))?;

        tracing::info!(url = %config.url, "Connected to Redis revocation store");

        Ok(Self { conn })
    }

    pub async fn from_env() -> Result<Self, RevocationError> {
        Self::new(RedisConfig::from_env()).await
    }

    fn key(jti: Uuid) -> String {
        format!("revoked:{jti}")
    }
}

#[async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn revoke(&self, jti: Uuid, ttl: Duration) -> Result<(), RevocationError> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(Self::key(jti), 1u8, ttl.as_secs().max(1))
            .await
            .map_err(|e| RevocationError::Operation(e.to_string()))
    }

    async fn is_revoked(&self, jti: Uuid) -> Result<bool, RevocationError> {
        let mut conn = self.conn.clone();
        conn.exists::<_, bool>(Self::key(jti))
            .await
            .map_err(|e| RevocationError::Operation(e.to_string()))
    }
}
