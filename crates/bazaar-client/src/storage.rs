//! Client-local persistence channels.

use parking_lot::RwLock;

use bazaar_core::domain::Item;

/// Durable client storage for a guest item list (the localStorage analog).
pub trait LocalItems: Send + Sync {
    fn load(&self) -> Vec<Item>;

    fn save(&self, items: &[Item]);

    fn clear(&self);
}

/// The token channel readable by both client and server (the cookie analog).
/// This is the single source of truth for "is there a session"; any cached
/// user is a derived view.
pub trait TokenChannel: Send + Sync {
    fn read(&self) -> Option<String>;

    fn write(&self, token: &str);

    fn clear(&self);
}

/// In-memory guest list.
#[derive(Default)]
pub struct InMemoryLocalItems {
    items: RwLock<Vec<Item>>,
}

impl InMemoryLocalItems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Vec<Item>) -> Self {
        Self {
            items: RwLock::new(items),
        }
    }
}

impl LocalItems for InMemoryLocalItems {
    fn load(&self) -> Vec<Item> {
        self.items.read().clone()
    }

    fn save(&self, items: &[Item]) {
        *self.items.write() = items.to_vec();
    }

    fn clear(&self) {
        self.items.write().clear();
    }
}

/// In-memory token channel.
#[derive(Default)]
pub struct InMemoryTokenChannel {
    token: RwLock<Option<String>>,
}

impl InMemoryTokenChannel {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenChannel for InMemoryTokenChannel {
    fn read(&self) -> Option<String> {
        self.token.read().clone()
    }

    fn write(&self, token: &str) {
        *self.token.write() = Some(token.to_string());
    }

    fn clear(&self) {
        *self.token.write() = None;
    }
}
