//! Rate limiting port.

use async_trait::async_trait;
use std::time::Duration;

/// Rate limiter keyed by a client identifier (IP address or user id).
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Check whether a request under `key` is allowed and update the counter.
    async fn check(&self, key: &str) -> Result<RateLimitResult, RateLimitError>;
}

/// Result of a rate limit check.
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_after: Duration,
}

/// Rate limit errors.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Backend error: {0}")]
    Backend(String),
}
