//! In-memory user, refresh-token, and item stores.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use bazaar_core::domain::{Item, ItemKey, ListKind, User};
use bazaar_core::error::RepoError;
use bazaar_core::ports::{ItemStore, RefreshTokenRecord, RefreshTokenStore, UserStore};

/// HashMap-backed user store.
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn save(&self, mut user: User) -> Result<User, RepoError> {
        user.updated_at = Utc::now();
        self.users.write().await.insert(user.id, user.clone());
        Ok(user)
    }

    async fn record_login_failure(&self, id: Uuid) -> Result<u32, RepoError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(RepoError::NotFound)?;
        user.failed_login_attempts += 1;
        user.updated_at = Utc::now();
        Ok(user.failed_login_attempts)
    }

    async fn lock_until(&self, id: Uuid, until: DateTime<Utc>) -> Result<(), RepoError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(RepoError::NotFound)?;
        user.locked_until = Some(until);
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn clear_login_failures(&self, id: Uuid) -> Result<(), RepoError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(RepoError::NotFound)?;
        user.failed_login_attempts = 0;
        user.locked_until = None;
        user.updated_at = Utc::now();
        Ok(())
    }
}

/// HashMap-backed refresh-token store, keyed by jti.
pub struct InMemoryRefreshTokenStore {
    records: RwLock<HashMap<Uuid, RefreshTokenRecord>>,
}

impl InMemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryRefreshTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn save(&self, record: RefreshTokenRecord) -> Result<(), RepoError> {
        self.records.write().await.insert(record.jti, record);
        Ok(())
    }

    async fn find_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshTokenRecord>, RepoError> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|r| r.token_hash == token_hash)
            .cloned())
    }

    async fn revoke(&self, jti: Uuid) -> Result<(), RepoError> {
        let mut records = self.records.write().await;
        if let Some(record) = records.get_mut(&jti) {
            record.revoked_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<(), RepoError> {
        let mut records = self.records.write().await;
        let now = Utc::now();
        for record in records.values_mut().filter(|r| r.user_id == user_id) {
            record.revoked_at = Some(now);
        }
        Ok(())
    }
}

/// Per-user item lists for one list kind. The kind decides the idempotent
/// `add` semantics: carts sum quantities, wishlists keep one entry per key.
pub struct InMemoryItemStore {
    kind: ListKind,
    lists: RwLock<HashMap<Uuid, Vec<Item>>>,
}

impl InMemoryItemStore {
    pub fn new(kind: ListKind) -> Self {
        Self {
            kind,
            lists: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    fn kind(&self) -> ListKind {
        self.kind
    }

    async fn list(&self, user_id: Uuid) -> Result<Vec<Item>, RepoError> {
        Ok(self
            .lists
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn add(&self, user_id: Uuid, item: Item) -> Result<Vec<Item>, RepoError> {
        let mut lists = self.lists.write().await;
        let list = lists.entry(user_id).or_default();

        let key = item.key();
        match list.iter_mut().find(|existing| existing.matches(&key)) {
            Some(existing) => {
                if self.kind == ListKind::Cart {
                    existing.quantity += item.quantity;
                }
            }
            None => list.push(item),
        }

        Ok(list.clone())
    }

    async fn set_quantity(
        &self,
        user_id: Uuid,
        key: &ItemKey,
        quantity: u32,
    ) -> Result<Vec<Item>, RepoError> {
        let mut lists = self.lists.write().await;
        let list = lists.get_mut(&user_id).ok_or(RepoError::NotFound)?;

        if quantity == 0 {
            let before = list.len();
            list.retain(|item| !item.matches(key));
            if list.len() == before {
                return Err(RepoError::NotFound);
            }
        } else {
            let item = list
                .iter_mut()
                .find(|item| item.matches(key))
                .ok_or(RepoError::NotFound)?;
            item.quantity = quantity;
        }

        Ok(list.clone())
    }

    async fn remove(&self, user_id: Uuid, key: &ItemKey) -> Result<Vec<Item>, RepoError> {
        let mut lists = self.lists.write().await;
        let list = lists.entry(user_id).or_default();
        list.retain(|item| !item.matches(key));
        Ok(list.clone())
    }

    async fn clear(&self, user_id: Uuid) -> Result<(), RepoError> {
        self.lists.write().await.remove(&user_id);
        Ok(())
    }
}
