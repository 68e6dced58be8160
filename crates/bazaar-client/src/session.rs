//! Session client: login/logout/refresh plus the one-time sync trigger.
//!
//! The token channel is the single source of truth for session liveness;
//! the cached principal is a derived view that goes away with the token.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use bazaar_core::domain::Principal;

use crate::api::{AuthApi, ClientError};
use crate::storage::TokenChannel;
use crate::sync::SyncOnLogin;

pub struct SessionClient<A, T> {
    api: A,
    tokens: T,
    user: RwLock<Option<Principal>>,
    refresh_token: Mutex<Option<String>>,
    engines: Vec<Arc<dyn SyncOnLogin>>,
}

impl<A: AuthApi, T: TokenChannel> SessionClient<A, T> {
    pub fn new(api: A, tokens: T) -> Self {
        Self {
            api,
            tokens,
            user: RwLock::new(None),
            refresh_token: Mutex::new(None),
            engines: Vec::new(),
        }
    }

    /// Attach an item-sync engine driven by this client's login/logout.
    pub fn register_engine(&mut self, engine: Arc<dyn SyncOnLogin>) {
        self.engines.push(engine);
    }

    pub fn is_logged_in(&self) -> bool {
        self.tokens.read().is_some()
    }

    /// The cached principal, valid only while the token channel holds a
    /// session.
    pub fn current_user(&self) -> Option<Principal> {
        if self.tokens.read().is_none() {
            return None;
        }
        self.user.read().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.tokens.read()
    }

    /// Authenticate and run the one-time merge on every registered engine.
    pub async fn login(&self, email: &str, password: &str) -> Result<Principal, ClientError> {
        let session = self.api.login(email, password).await?;

        self.tokens.write(&session.access_token);
        *self.user.write() = Some(session.principal.clone());
        *self.refresh_token.lock() = Some(session.refresh_token);

        for engine in &self.engines {
            let report = engine.merge_on_login().await;
            if report.failed > 0 {
                tracing::warn!(
                    list = %engine.kind().as_str(),
                    merged = report.merged,
                    failed = report.failed,
                    "guest list merged with dropped lines"
                );
            }
        }

        Ok(session.principal)
    }

    /// Exchange the held refresh token for a fresh access token.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        let refresh_token = self
            .refresh_token
            .lock()
            .clone()
            .ok_or_else(|| ClientError::Rejected("no refresh token held".into()))?;

        let access_token = self.api.refresh(&refresh_token).await?;
        self.tokens.write(&access_token);
        Ok(())
    }

    /// End the session. Server-side revocation is best effort; local state
    /// is always cleared and engines return to guest reads.
    pub async fn logout(&self) {
        if let Some(token) = self.tokens.read() {
            if let Err(error) = self.api.logout(&token).await {
                tracing::warn!(%error, "server-side logout failed");
            }
        }

        self.tokens.clear();
        *self.user.write() = None;
        *self.refresh_token.lock() = None;

        for engine in &self.engines {
            engine.reset_to_guest();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use bazaar_core::domain::{Item, ListKind, Role};

    use crate::storage::{InMemoryLocalItems, InMemoryTokenChannel};
    use crate::sync::{ItemSyncEngine, SessionPhase};
    use crate::testing::{FakeAuthApi, FakeItemsApi};

    type Engine = ItemSyncEngine<InMemoryLocalItems, Arc<FakeItemsApi>>;

    fn client_with_cart(
        local: Vec<Item>,
    ) -> (
        SessionClient<Arc<FakeAuthApi>, InMemoryTokenChannel>,
        Arc<FakeAuthApi>,
        Arc<FakeItemsApi>,
        Arc<Engine>,
    ) {
        let auth = Arc::new(FakeAuthApi::new("user@example.com", "hunter2good", Role::Customer));
        let cart_api = Arc::new(FakeItemsApi::new(ListKind::Cart));
        let engine = Arc::new(ItemSyncEngine::new(
            ListKind::Cart,
            InMemoryLocalItems::with_items(local),
            cart_api.clone(),
        ));

        let mut client = SessionClient::new(auth.clone(), InMemoryTokenChannel::new());
        client.register_engine(engine.clone());
        (client, auth, cart_api, engine)
    }

    #[tokio::test]
    async fn login_with_guest_cart_merges_and_authenticates() {
        let (client, _auth, cart_api, engine) = client_with_cart(vec![
            Item::new("p1", 1, None),
            Item::new("p2", 3, None),
        ]);

        assert!(!client.is_logged_in());

        let principal = client.login("user@example.com", "hunter2good").await.unwrap();
        assert_eq!(principal.role, Role::Customer);
        assert!(client.is_logged_in());
        assert_eq!(engine.phase(), SessionPhase::Authenticated);

        let server = cart_api.server_items();
        assert_eq!(server.len(), 2);
        assert_eq!(server[0], Item::new("p1", 1, None));
        assert_eq!(server[1], Item::new("p2", 3, None));
    }

    #[tokio::test]
    async fn failed_login_stays_guest() {
        let (client, _auth, cart_api, engine) =
            client_with_cart(vec![Item::new("p1", 1, None)]);

        let err = client.login("user@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, ClientError::Rejected(_)));
        assert!(!client.is_logged_in());
        assert_eq!(engine.phase(), SessionPhase::Guest);
        assert_eq!(cart_api.add_calls(), 0);
        assert_eq!(engine.items(), vec![Item::new("p1", 1, None)]);
    }

    #[tokio::test]
    async fn logout_clears_channel_and_rearms_guest_reads() {
        let (client, auth, cart_api, engine) =
            client_with_cart(vec![Item::new("p1", 2, None)]);

        client.login("user@example.com", "hunter2good").await.unwrap();
        client.logout().await;

        assert_eq!(auth.logout_calls.load(Ordering::SeqCst), 1);
        assert!(!client.is_logged_in());
        assert!(client.current_user().is_none());
        assert_eq!(engine.phase(), SessionPhase::Guest);

        // Logout does not delete the server list.
        assert_eq!(cart_api.server_items(), vec![Item::new("p1", 2, None)]);
    }

    #[tokio::test]
    async fn second_login_merges_again_from_a_clean_slate() {
        let (client, _auth, cart_api, engine) =
            client_with_cart(vec![Item::new("p1", 2, None)]);

        client.login("user@example.com", "hunter2good").await.unwrap();
        client.logout().await;
        client.login("user@example.com", "hunter2good").await.unwrap();

        // The guest list was consumed by the first merge.
        assert_eq!(cart_api.add_calls(), 1);
        assert_eq!(cart_api.server_items(), vec![Item::new("p1", 2, None)]);
        assert_eq!(engine.phase(), SessionPhase::Authenticated);
    }

    #[tokio::test]
    async fn cached_user_dies_with_the_token_channel() {
        let auth = Arc::new(FakeAuthApi::new("user@example.com", "hunter2good", Role::Customer));
        let channel = InMemoryTokenChannel::new();
        let client = SessionClient::new(auth, channel);

        client.login("user@example.com", "hunter2good").await.unwrap();
        assert!(client.current_user().is_some());

        // The channel is the source of truth; dropping it invalidates the
        // cached principal.
        client.tokens.clear();
        assert!(client.current_user().is_none());
        assert!(!client.is_logged_in());
    }

    #[tokio::test]
    async fn refresh_rewrites_the_token_channel() {
        let (client, _auth, _cart_api, _engine) = client_with_cart(vec![]);

        client.login("user@example.com", "hunter2good").await.unwrap();
        let before = client.access_token().unwrap();

        client.refresh().await.unwrap();
        let after = client.access_token().unwrap();
        assert_ne!(before, after);
    }

    #[tokio::test]
    async fn wishlist_and_cart_engines_both_merge_on_one_login() {
        let auth = Arc::new(FakeAuthApi::new("user@example.com", "hunter2good", Role::Customer));
        let cart_api = Arc::new(FakeItemsApi::new(ListKind::Cart));
        let wish_api = Arc::new(FakeItemsApi::new(ListKind::Wishlist));

        let cart = Arc::new(ItemSyncEngine::new(
            ListKind::Cart,
            InMemoryLocalItems::with_items(vec![Item::new("p1", 2, None)]),
            cart_api.clone(),
        ));
        let wishlist = Arc::new(
            ItemSyncEngine::new(
                ListKind::Wishlist,
                InMemoryLocalItems::with_items(vec![Item::new("p9", 1, None)]),
                wish_api.clone(),
            )
            .with_add_timeout(Duration::from_secs(1)),
        );

        let mut client = SessionClient::new(auth, InMemoryTokenChannel::new());
        client.register_engine(cart.clone());
        client.register_engine(wishlist.clone());

        client.login("user@example.com", "hunter2good").await.unwrap();

        assert_eq!(cart_api.server_items(), vec![Item::new("p1", 2, None)]);
        assert_eq!(wish_api.server_items(), vec![Item::new("p9", 1, None)]);
        assert_eq!(cart.phase(), SessionPhase::Authenticated);
        assert_eq!(wishlist.phase(), SessionPhase::Authenticated);
    }
}
