//! Response envelopes.

use serde::{Deserialize, Serialize};

use crate::dto::ItemPayload;

/// Flat denial/error body: `{"error": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Envelope for the cart and wishlist endpoints:
/// `{"success": true, "items": [...]}` or `{"success": false, "error": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemsEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ItemPayload>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ItemsEnvelope {
    pub fn ok(items: Vec<ItemPayload>) -> Self {
        Self {
            success: true,
            items: Some(items),
            error: None,
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            items: None,
            error: Some(error.into()),
        }
    }
}
