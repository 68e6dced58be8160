//! Application configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use bazaar_infra::auth::JwtConfig;
use bazaar_infra::rate_limit::RateLimitConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub redis_url: Option<String>,
    pub rate_limit: RateLimitConfig,
    pub security: SecuritySettings,
}

/// Login-hardening knobs.
#[derive(Debug, Clone)]
pub struct SecuritySettings {
    /// Failures before the account locks.
    pub max_failed_logins: u32,
    /// How long a locked account stays locked.
    pub lockout: Duration,
    /// Mark the session cookie `Secure` (production).
    pub cookie_secure: bool,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            max_failed_logins: 5,
            lockout: Duration::from_secs(30 * 60),
            cookie_secure: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = SecuritySettings::default();
        let is_production = env::var("RUST_ENV")
            .map(|v| v == "production" || v == "prod")
            .unwrap_or(false);

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            jwt: JwtConfig::from_env(),
            redis_url: env::var("REDIS_URL").ok(),
            rate_limit: RateLimitConfig::from_env(),
            security: SecuritySettings {
                max_failed_logins: env::var("MAX_FAILED_LOGINS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.max_failed_logins),
                lockout: Duration::from_secs(
                    env::var("LOCKOUT_DURATION_SECS")
                        .ok()
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(defaults.lockout.as_secs()),
                ),
                cookie_secure: is_production,
            },
        }
    }
}
