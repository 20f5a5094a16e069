//! Memoization Module
//!
//! Caches function results keyed by a hash of their arguments.

mod key;
mod memoized;

pub use key::{derive_namespace, KeyBuilder};
pub use memoized::{memoize, MemoizeOptions, Memoized};
