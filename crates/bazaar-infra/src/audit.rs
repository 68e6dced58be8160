//! Security audit sinks.

use async_trait::async_trait;
use tokio::sync::RwLock;

use bazaar_core::ports::{SecurityAudit, SecurityEvent};

/// Audit sink that emits structured tracing events. The log pipeline is the
/// system of record in deployments without a dedicated audit table.
pub struct TracingAudit;

#[async_trait]
impl SecurityAudit for TracingAudit {
    async fn record(&self, event: SecurityEvent) {
        let missing: Vec<&str> = event
            .missing_permissions
            .iter()
            .map(|p| p.as_str())
            .collect();

        tracing::warn!(
            kind = ?event.kind,
            actor = ?event.actor,
            ip = %event.ip,
            user_agent = %event.user_agent,
            method = %event.method,
            path = %event.path,
            missing = ?missing,
            "security event"
        );
    }
}

/// Capturing sink for tests.
pub struct InMemoryAudit {
    events: RwLock<Vec<SecurityEvent>>,
}

impl InMemoryAudit {
    pub fn new() -> Self {
        Self {
            events: RwLock::new(Vec::new()),
        }
    }

    pub async fn events(&self) -> Vec<SecurityEvent> {
        self.events.read().await.clone()
    }
}

impl Default for InMemoryAudit {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecurityAudit for InMemoryAudit {
    async fn record(&self, event: SecurityEvent) {
        self.events.write().await.push(event);
    }
}
