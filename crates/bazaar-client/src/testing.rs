//! Shared fakes for the client tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use bazaar_core::domain::{Item, ListKind, Principal, Role};

use crate::api::{AuthApi, ClientError, ItemsApi, LoginSession};

/// Server-side item list with the idempotent-add contract, plus call
/// counters and failure injection.
pub struct FakeItemsApi {
    kind: ListKind,
    server: Mutex<Vec<Item>>,
    add_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
    failing: Mutex<Vec<String>>,
    hanging: Mutex<Vec<String>>,
}

impl FakeItemsApi {
    pub fn new(kind: ListKind) -> Self {
        Self {
            kind,
            server: Mutex::new(Vec::new()),
            add_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
            failing: Mutex::new(Vec::new()),
            hanging: Mutex::new(Vec::new()),
        }
    }

    pub fn preload(&self, items: Vec<Item>) {
        *self.server.lock() = items;
    }

    pub fn server_items(&self) -> Vec<Item> {
        self.server.lock().clone()
    }

    pub fn add_calls(&self) -> usize {
        self.add_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn fail_product(&self, product_id: &str) {
        self.failing.lock().push(product_id.to_string());
    }

    pub fn hang_product(&self, product_id: &str) {
        self.hanging.lock().push(product_id.to_string());
    }
}

#[async_trait]
impl ItemsApi for Arc<FakeItemsApi> {
    async fn fetch(&self) -> Result<Vec<Item>, ClientError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.server_items())
    }

    async fn add(&self, item: &Item) -> Result<(), ClientError> {
        self.add_calls.fetch_add(1, Ordering::SeqCst);

        if self.hanging.lock().contains(&item.product_id) {
            tokio::time::sleep(Duration::from_secs(86400)).await;
        }
        if self.failing.lock().contains(&item.product_id) {
            return Err(ClientError::Transport("injected failure".into()));
        }

        let mut server = self.server.lock();
        let key = item.key();
        match server.iter_mut().find(|existing| existing.matches(&key)) {
            Some(existing) => {
                if self.kind == ListKind::Cart {
                    existing.quantity += item.quantity;
                }
            }
            None => server.push(item.clone()),
        }
        Ok(())
    }
}

/// Single-account auth endpoint fake.
pub struct FakeAuthApi {
    pub email: String,
    pub password: String,
    pub principal: Principal,
    pub logout_calls: AtomicUsize,
}

impl FakeAuthApi {
    pub fn new(email: &str, password: &str, role: Role) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
            principal: Principal {
                id: Uuid::new_v4(),
                email: email.to_string(),
                name: "Test User".to_string(),
                role,
            },
            logout_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl AuthApi for Arc<FakeAuthApi> {
    async fn login(&self, email: &str, password: &str) -> Result<LoginSession, ClientError> {
        if email == self.email && password == self.password {
            Ok(LoginSession {
                principal: self.principal.clone(),
                access_token: format!("access-{}", Uuid::new_v4()),
                refresh_token: format!("refresh-{}", Uuid::new_v4()),
            })
        } else {
            Err(ClientError::Rejected("Invalid email or password".into()))
        }
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<String, ClientError> {
        Ok(format!("access-{}", Uuid::new_v4()))
    }

    async fn logout(&self, _access_token: &str) -> Result<(), ClientError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
