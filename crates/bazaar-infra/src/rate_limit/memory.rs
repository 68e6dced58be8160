//! Keyed in-memory rate limiter using the governor crate.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::{Clock, DefaultClock};
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter as GovernorRateLimiter};

use bazaar_core::ports::{RateLimitError, RateLimitResult, RateLimiter};

type KeyedLimiter = GovernorRateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window.
    pub max_requests: u32,
    /// Window duration.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(900),
        }
    }
}

impl RateLimitConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_requests: std::env::var("AUTH_RATE_LIMIT_MAX_REQUESTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_requests),
            window: Duration::from_secs(
                std::env::var("AUTH_RATE_LIMIT_WINDOW_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.window.as_secs()),
            ),
        }
    }
}

/// Per-key GCRA limiter. Keys are client identifiers (IP addresses), so one
/// abusive client cannot exhaust the budget for everyone.
///
/// Note: limits are per-process, not distributed across instances.
pub struct KeyedRateLimiter {
    limiter: KeyedLimiter,
    config: RateLimitConfig,
}

impl KeyedRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let quota = Quota::with_period(config.window / config.max_requests)
            .expect("Valid quota")
            .allow_burst(NonZeroU32::new(config.max_requests).expect("Non-zero"));

        Self {
            limiter: GovernorRateLimiter::keyed(quota),
            config,
        }
    }

    pub fn from_env() -> Self {
        Self::new(RateLimitConfig::from_env())
    }
}

#[async_trait]
impl RateLimiter for KeyedRateLimiter {
    async fn check(&self, key: &str) -> Result<RateLimitResult, RateLimitError> {
        match self.limiter.check_key(&key.to_string()) {
            Ok(_) => Ok(RateLimitResult {
                allowed: true,
                remaining: self.config.max_requests, // Approximate
                reset_after: self.config.window,
            }),
            Err(not_until) => Ok(RateLimitResult {
                allowed: false,
                remaining: 0,
                reset_after: not_until.wait_time_from(DefaultClock::default().now()),
            }),
        }
    }
}
