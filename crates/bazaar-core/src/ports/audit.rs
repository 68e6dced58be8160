//! Security audit port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::Permission;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityEventKind {
    UnauthorizedAccess,
    AccountLocked,
}

/// A security-relevant occurrence worth an audit trail entry. Written only
/// for authorization denials and lockouts, not routine expired-token noise.
#[derive(Debug, Clone)]
pub struct SecurityEvent {
    pub actor: Option<Uuid>,
    pub kind: SecurityEventKind,
    pub ip: String,
    pub user_agent: String,
    pub method: String,
    pub path: String,
    pub missing_permissions: Vec<Permission>,
    pub at: DateTime<Utc>,
}

#[async_trait]
pub trait SecurityAudit: Send + Sync {
    async fn record(&self, event: SecurityEvent);
}
