//! Store-level error types shared by every persistence port.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Store connection failed: {0}")]
    Connection(String),

    #[error("Store operation failed: {0}")]
    Operation(String),

    #[error("Entity not found")]
    NotFound,
}
