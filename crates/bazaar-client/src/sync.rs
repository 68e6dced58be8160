//! One-time reconciliation of a guest item list into the server list.
//!
//! The engine is a phase machine: `Guest -> Syncing -> Authenticated`. The
//! transition into `Syncing` is the concurrency guard - a second trigger
//! while a merge is in flight (or already done) is a no-op, never a double
//! merge.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::time::timeout;

use bazaar_core::domain::{Item, ListKind};

use crate::api::ItemsApi;
use crate::storage::LocalItems;

const DEFAULT_ADD_TIMEOUT: Duration = Duration::from_secs(3);

/// Client session phase for one guarded list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Guest,
    Syncing,
    Authenticated,
}

/// Outcome of a merge run. A nonzero `failed` count is an accepted, logged
/// degradation - it never blocks the login.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub merged: usize,
    pub failed: usize,
}

/// Merges the locally-held guest list into the authoritative server list
/// exactly once per login, then serves reads from the server-backed view.
pub struct ItemSyncEngine<L, A> {
    kind: ListKind,
    local: L,
    api: A,
    phase: Mutex<SessionPhase>,
    view: RwLock<Vec<Item>>,
    add_timeout: Duration,
}

impl<L: LocalItems, A: ItemsApi> ItemSyncEngine<L, A> {
    pub fn new(kind: ListKind, local: L, api: A) -> Self {
        Self {
            kind,
            local,
            api,
            phase: Mutex::new(SessionPhase::Guest),
            view: RwLock::new(Vec::new()),
            add_timeout: DEFAULT_ADD_TIMEOUT,
        }
    }

    pub fn with_add_timeout(mut self, add_timeout: Duration) -> Self {
        self.add_timeout = add_timeout;
        self
    }

    pub fn kind(&self) -> ListKind {
        self.kind
    }

    pub fn phase(&self) -> SessionPhase {
        *self.phase.lock()
    }

    /// Current list as the UI should see it: the guest list before login,
    /// the server-backed view afterwards.
    pub fn items(&self) -> Vec<Item> {
        match self.phase() {
            SessionPhase::Guest => self.local.load(),
            SessionPhase::Syncing | SessionPhase::Authenticated => self.view.read().clone(),
        }
    }

    /// Run the one-time merge. Only the trigger that wins the
    /// `Guest -> Syncing` transition does any work.
    pub async fn merge_on_login(&self) -> SyncReport {
        {
            let mut phase = self.phase.lock();
            if *phase != SessionPhase::Guest {
                return SyncReport::default();
            }
            *phase = SessionPhase::Syncing;
        }

        let local_items = self.local.load();
        if local_items.is_empty() {
            *self.phase.lock() = SessionPhase::Authenticated;
            return SyncReport::default();
        }

        let mut report = SyncReport::default();
        for item in &local_items {
            match timeout(self.add_timeout, self.api.add(item)).await {
                Ok(Ok(())) => report.merged += 1,
                Ok(Err(error)) => {
                    report.failed += 1;
                    tracing::warn!(
                        list = %self.kind.as_str(),
                        product = %item.product_id,
                        %error,
                        "merge add failed"
                    );
                }
                Err(_) => {
                    report.failed += 1;
                    tracing::warn!(
                        list = %self.kind.as_str(),
                        product = %item.product_id,
                        "merge add timed out"
                    );
                }
            }
        }

        // Cleared even after partial failure: a retry on the next login
        // would double-count the lines that did land.
        self.local.clear();

        match timeout(self.add_timeout, self.api.fetch()).await {
            Ok(Ok(items)) => *self.view.write() = items,
            Ok(Err(error)) => {
                tracing::warn!(list = %self.kind.as_str(), %error, "post-merge reload failed");
            }
            Err(_) => {
                tracing::warn!(list = %self.kind.as_str(), "post-merge reload timed out");
            }
        }

        *self.phase.lock() = SessionPhase::Authenticated;
        report
    }

    /// Drop the server-backed view and serve guest reads again. The server
    /// list itself is untouched.
    pub fn reset_to_guest(&self) {
        *self.phase.lock() = SessionPhase::Guest;
        self.view.write().clear();
    }
}

/// Object-safe handle the session client uses to drive its engines.
#[async_trait]
pub trait SyncOnLogin: Send + Sync {
    async fn merge_on_login(&self) -> SyncReport;

    fn reset_to_guest(&self);

    fn kind(&self) -> ListKind;
}

#[async_trait]
impl<L: LocalItems + 'static, A: ItemsApi + 'static> SyncOnLogin for ItemSyncEngine<L, A> {
    async fn merge_on_login(&self) -> SyncReport {
        ItemSyncEngine::merge_on_login(self).await
    }

    fn reset_to_guest(&self) {
        ItemSyncEngine::reset_to_guest(self);
    }

    fn kind(&self) -> ListKind {
        ItemSyncEngine::kind(self)
    }
}
