//! Application state - dependency-injected services shared by all handlers.

use std::sync::Arc;

use bazaar_core::domain::ListKind;
use bazaar_core::ports::{
    ItemStore, PasswordService, RefreshTokenStore, RevocationStore, SecurityAudit, TokenService,
    UserStore,
};
use bazaar_core::rbac::RbacPolicy;
use bazaar_infra::audit::TracingAudit;
use bazaar_infra::auth::{Argon2PasswordService, HsTokenService};
use bazaar_infra::revocation::InMemoryRevocationStore;
use bazaar_infra::store::{InMemoryItemStore, InMemoryRefreshTokenStore, InMemoryUserStore};

use crate::config::{AppConfig, SecuritySettings};

/// Shared application state. Every service is an explicitly constructed
/// trait object, so tests substitute fakes without any module tricks.
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub revocations: Arc<dyn RevocationStore>,
    pub users: Arc<dyn UserStore>,
    pub refresh_tokens: Arc<dyn RefreshTokenStore>,
    pub cart: Arc<dyn ItemStore>,
    pub wishlist: Arc<dyn ItemStore>,
    pub audit: Arc<dyn SecurityAudit>,
    pub policy: Arc<RbacPolicy>,
    pub security: SecuritySettings,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        #[cfg(feature = "redis")]
        let revocations: Arc<dyn RevocationStore> = {
            use bazaar_infra::revocation::{RedisConfig, RedisRevocationStore};

            if config.redis_url.is_some() {
                match RedisRevocationStore::new(RedisConfig::from_env()).await {
                    Ok(store) => Arc::new(store),
                    Err(e) => {
                        tracing::error!(
                            "Failed to connect to Redis: {}. Using in-memory revocation store.",
                            e
                        );
                        Arc::new(InMemoryRevocationStore::new())
                    }
                }
            } else {
                tracing::warn!("REDIS_URL not set. Using in-memory revocation store.");
                Arc::new(InMemoryRevocationStore::new())
            }
        };

        #[cfg(not(feature = "redis"))]
        let revocations: Arc<dyn RevocationStore> = {
            tracing::info!("Running without redis feature - using in-memory revocation store");
            Arc::new(InMemoryRevocationStore::new())
        };

        let state = Self {
            tokens: Arc::new(HsTokenService::new(config.jwt.clone())),
            passwords: Arc::new(Argon2PasswordService::new()),
            revocations,
            users: Arc::new(InMemoryUserStore::new()),
            refresh_tokens: Arc::new(InMemoryRefreshTokenStore::new()),
            cart: Arc::new(InMemoryItemStore::new(ListKind::Cart)),
            wishlist: Arc::new(InMemoryItemStore::new(ListKind::Wishlist)),
            audit: Arc::new(TracingAudit),
            policy: Arc::new(RbacPolicy::new()),
            security: config.security.clone(),
        };

        tracing::info!("Application state initialized");
        state
    }
}
