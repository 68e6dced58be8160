//! In-memory store implementations. A relational backend implements the
//! same ports and drops in behind the application state.

mod memory;

pub use memory::{InMemoryItemStore, InMemoryRefreshTokenStore, InMemoryUserStore};
