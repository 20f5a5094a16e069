//! Catalog Cache - An in-process memoization cache
//!
//! Provides TTL expiration, hybrid LFU/LRU eviction, namespace invalidation
//! and function memoization for a single process.

pub mod cache;
pub mod config;
pub mod error;
pub mod invalidation;
pub mod memoize;
pub mod tasks;

pub use cache::{Cache, CacheStats};
pub use config::Config;
pub use error::{CacheError, Result};
pub use invalidation::{invalidate_cache, Invalidator};
pub use memoize::{memoize, KeyBuilder, MemoizeOptions, Memoized};
pub use tasks::{spawn_cleanup_task, CleanupHandle};
