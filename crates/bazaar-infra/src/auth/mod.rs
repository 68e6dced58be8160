//! Authentication adapters: HS256 access tokens, opaque refresh tokens,
//! Argon2 password hashing.

mod jwt;
mod opaque;
mod password;

pub use jwt::{HsTokenService, JwtConfig};
pub use password::Argon2PasswordService;
