//! Error types for the cache
//!
//! Cache reads and writes never fail; absence is `None`. Errors only come
//! from the ambient surface: configuration and the cleanup task lifecycle.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache crate.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Background cleanup task could not be joined
    #[error("Cleanup task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

// == Result Type Alias ==
/// Convenience Result type for the cache crate.
pub type Result<T> = std::result::Result<T, CacheError>;
