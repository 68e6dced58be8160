//! # Bazaar Core
//!
//! The domain layer of the marketplace identity and session core.
//! This crate contains pure business logic with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod rbac;

pub use error::RepoError;
