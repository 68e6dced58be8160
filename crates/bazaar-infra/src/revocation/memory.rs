//! In-memory revocation set - used when Redis is not configured.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use bazaar_core::ports::{RevocationError, RevocationStore};

/// Revoked-jti set with per-entry expiry.
///
/// Entries are dropped lazily on lookup once the backing token would have
/// expired anyway. Data is lost on process restart.
pub struct InMemoryRevocationStore {
    revoked: RwLock<HashMap<Uuid, Instant>>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self {
            revoked: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryRevocationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn revoke(&self, jti: Uuid, ttl: Duration) -> Result<(), RevocationError> {
        let mut revoked = self.revoked.write().await;
        revoked.insert(jti, Instant::now() + ttl);
        Ok(())
    }

    async fn is_revoked(&self, jti: Uuid) -> Result<bool, RevocationError> {
        let revoked = self.revoked.read().await;
        match revoked.get(&jti) {
            Some(expires_at) if *expires_at > Instant::now() => Ok(true),
            Some(_) => {
                drop(revoked);
                let mut revoked = self.revoked.write().await;
                revoked.remove(&jti);
                Ok(false)
            }
            None => Ok(false),
        }
    }
}
