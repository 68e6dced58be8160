//! Opaque token helpers: random generation and one-way hashing.
//!
//! Refresh tokens are not claim sets; they are random strings whose SHA-256
//! digest is what gets persisted. A leaked store never yields a usable token.

use rand::Rng;
use rand::distributions::Alphanumeric;
use sha2::{Digest, Sha256};

pub fn generate(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

pub fn hash(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Compare without early exit.
pub fn verify(token: &str, digest: &str) -> bool {
    let computed = hash(token);
    computed.len() == digest.len()
        && computed
            .bytes()
            .zip(digest.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}
