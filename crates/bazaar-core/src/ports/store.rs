//! Persistence ports: users, refresh tokens, and the server-side item lists.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Item, ItemKey, ListKind, User};
use crate::error::RepoError;
use crate::ports::RefreshTokenRecord;

/// User store with the operations the identity core needs.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// Save a user (create or update).
    async fn save(&self, user: User) -> Result<User, RepoError>;

    /// Increment the failed-login counter; returns the new count.
    async fn record_login_failure(&self, id: Uuid) -> Result<u32, RepoError>;

    async fn lock_until(&self, id: Uuid, until: DateTime<Utc>) -> Result<(), RepoError>;

    /// Reset the failure counter and clear any lock.
    async fn clear_login_failures(&self, id: Uuid) -> Result<(), RepoError>;
}

/// Refresh-token store. Records are looked up by token hash, never by the
/// raw token.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn save(&self, record: RefreshTokenRecord) -> Result<(), RepoError>;

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, RepoError>;

    async fn revoke(&self, jti: Uuid) -> Result<(), RepoError>;

    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<(), RepoError>;
}

/// Authoritative per-user item list (one store per list kind).
///
/// `add` is idempotent on the line's identity key: re-adding an existing
/// cart line increments its quantity, re-adding a wishlist line is a no-op.
/// Mutating operations return the resulting list.
#[async_trait]
pub trait ItemStore: Send + Sync {
    fn kind(&self) -> ListKind;

    async fn list(&self, user_id: Uuid) -> Result<Vec<Item>, RepoError>;

    async fn add(&self, user_id: Uuid, item: Item) -> Result<Vec<Item>, RepoError>;

    /// Set a cart line's quantity; a quantity of zero removes the line.
    async fn set_quantity(
        &self,
        user_id: Uuid,
        key: &ItemKey,
        quantity: u32,
    ) -> Result<Vec<Item>, RepoError>;

    async fn remove(&self, user_id: Uuid, key: &ItemKey) -> Result<Vec<Item>, RepoError>;

    async fn clear(&self, user_id: Uuid) -> Result<(), RepoError>;
}
