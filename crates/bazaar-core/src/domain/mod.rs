mod item;
mod principal;
mod role;

pub use item::{Item, ItemKey, ListKind};
pub use principal::{Principal, User};
pub use role::{Permission, Role};
