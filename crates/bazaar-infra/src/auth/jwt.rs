//! HS256 access token service.

use std::time::Duration;

use chrono::{TimeDelta, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bazaar_core::domain::{Principal, Role};
use bazaar_core::ports::{AccessClaims, AuthError, RefreshTokenParts, TokenService};

use super::opaque;

const REFRESH_TOKEN_LEN: usize = 64;

/// Token service configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_days: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            issuer: "bazaar-marketplace".to_string(),
            audience: "bazaar-users".to_string(),
            access_ttl_secs: 15 * 60,
            refresh_ttl_days: 14,
        }
    }
}

impl JwtConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let secret = std::env::var("JWT_SECRET").unwrap_or(defaults.secret.clone());

        if secret == defaults.secret {
            let is_production = std::env::var("RUST_ENV")
                .map(|v| v == "production" || v == "prod")
                .unwrap_or(false);

            if is_production {
                tracing::error!(
                    "SECURITY: Using default JWT secret in production! Set JWT_SECRET environment variable."
                );
            } else {
                tracing::warn!("Using default JWT secret. Set JWT_SECRET for production use.");
            }
        }

        Self {
            secret,
            issuer: std::env::var("JWT_ISSUER").unwrap_or(defaults.issuer),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or(defaults.audience),
            access_ttl_secs: std::env::var("ACCESS_TOKEN_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.access_ttl_secs),
            refresh_ttl_days: std::env::var("REFRESH_TOKEN_TTL_DAYS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.refresh_ttl_days),
        }
    }
}

/// Serialized claim set. `sub` and `jti` travel as strings.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    role: Role,
    iss: String,
    aud: String,
    iat: i64,
    exp: i64,
    jti: String,
}

/// HS256-signed access tokens with opaque refresh tokens on the side.
pub struct HsTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    config: JwtConfig,
}

impl HsTokenService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            encoding_key,
            decoding_key,
            config,
        }
    }

    pub fn from_env() -> Self {
        Self::new(JwtConfig::from_env())
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::default();
        validation.leeway = 0;
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);
        validation
    }
}

impl TokenService for HsTokenService {
    fn issue_access_token(&self, principal: &Principal) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + TimeDelta::seconds(self.config.access_ttl_secs);

        let claims = Claims {
            sub: principal.id.to_string(),
            email: principal.email.clone(),
            role: principal.role,
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|_| AuthError::InvalidToken)
    }

    fn issue_refresh_token(&self) -> RefreshTokenParts {
        RefreshTokenParts {
            token: opaque::generate(REFRESH_TOKEN_LEN),
            jti: Uuid::new_v4(),
        }
    }

    fn verify_access_token(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation())
            .map_err(|_| AuthError::InvalidToken)?;
        let claims = data.claims;

        // The library validates these too; re-check explicitly so a
        // misconfigured Validation cannot silently widen acceptance.
        if claims.iss != self.config.issuer || claims.aud != self.config.audience {
            return Err(AuthError::InvalidToken);
        }
        if claims.exp <= Utc::now().timestamp() {
            return Err(AuthError::InvalidToken);
        }

        let sub = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
        let jti = Uuid::parse_str(&claims.jti).map_err(|_| AuthError::InvalidToken)?;

        Ok(AccessClaims {
            sub,
            email: claims.email,
            role: claims.role,
            iss: claims.iss,
            aud: claims.aud,
            iat: claims.iat,
            exp: claims.exp,
            jti,
        })
    }

    fn hash_opaque_token(&self, token: &str) -> String {
        opaque::hash(token)
    }

    fn verify_opaque_token_hash(&self, token: &str, digest: &str) -> bool {
        opaque::verify(token, digest)
    }

    fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.config.access_ttl_secs.max(0) as u64)
    }

    fn refresh_ttl(&self) -> Duration {
        Duration::from_secs((self.config.refresh_ttl_days.max(0) as u64) * 24 * 60 * 60)
    }
}
