//! Cart and wishlist entries.

use serde::{Deserialize, Serialize};

/// Which guarded list an item belongs to. The kind decides what an
/// idempotent re-add means: carts sum quantities, wishlists keep one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Cart,
    Wishlist,
}

impl ListKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cart => "cart",
            Self::Wishlist => "wishlist",
        }
    }
}

/// Identity key of a line: two entries are the same line iff both the
/// product and the variant match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemKey {
    pub product_id: String,
    pub variant: Option<String>,
}

/// One line of a cart or wishlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub product_id: String,
    pub quantity: u32,
    pub variant: Option<String>,
}

impl Item {
    pub fn new(product_id: impl Into<String>, quantity: u32, variant: Option<String>) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            variant,
        }
    }

    pub fn key(&self) -> ItemKey {
        ItemKey {
            product_id: self.product_id.clone(),
            variant: self.variant.clone(),
        }
    }

    pub fn matches(&self, key: &ItemKey) -> bool {
        self.product_id == key.product_id && self.variant == key.variant
    }
}
