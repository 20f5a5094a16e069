//! Memoized Functions
//!
//! Wraps a function so repeated calls with equal arguments are served from a
//! [`Cache`] until the stored result expires.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::Cache;
use crate::memoize::key::{derive_namespace, is_closure_namespace, KeyBuilder};

// == Memoize Options ==
/// TTL and namespace for a memoized function.
#[derive(Debug, Clone, Default)]
pub struct MemoizeOptions {
    /// TTL for stored results, the cache's default when None
    pub ttl: Option<Duration>,
    /// Namespace for stored results, derived from the function's name when None
    pub namespace: Option<String>,
}

impl MemoizeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

// == Memoize ==
/// Wraps `func` so its results are cached in `cache`.
///
/// The wrapped function takes its arguments as one `Serialize` value: a
/// tuple for several arguments, a struct for named ones. Calls whose
/// arguments cannot be serialized run the function directly and are never
/// cached.
///
/// Without an explicit namespace, every closure defined in one function
/// derives the same namespace; such closures should be named explicitly.
///
/// ```ignore
/// let cache = Cache::new(1000, Duration::from_secs(300));
/// let lookup = memoize(&cache, MemoizeOptions::new().ttl(Duration::from_secs(60)), load_pattern);
/// let pattern = lookup.call(42);
/// ```
pub fn memoize<F, V: Clone>(cache: &Cache<V>, options: MemoizeOptions, func: F) -> Memoized<F, V> {
    let namespace = options.namespace.unwrap_or_else(|| {
        let derived = derive_namespace::<F>();
        if is_closure_namespace(&derived) {
            warn!(namespace = %derived, "memoized closure without an explicit namespace");
        }
        derived
    });
    Memoized {
        cache: cache.clone(),
        namespace,
        ttl: options.ttl,
        func,
    }
}

// == Memoized ==
/// A function wrapped with a result cache.
///
/// The store lock is never held while the wrapped function runs. Concurrent
/// misses on the same key each run the function; the last result stored wins.
pub struct Memoized<F, V> {
    cache: Cache<V>,
    namespace: String,
    ttl: Option<Duration>,
    func: F,
}

impl<F, V: Clone> Memoized<F, V> {
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Cache key a call with `args` reads and writes, None when `args` cannot
    /// be serialized and the call bypasses the cache.
    pub fn key_for<A: Serialize + ?Sized>(&self, args: &A) -> Option<String> {
        match KeyBuilder::new(self.namespace.as_str()).try_arg(args) {
            Ok(builder) => Some(builder.build()),
            Err(err) => {
                debug!(
                    namespace = %self.namespace,
                    error = %err,
                    "arguments not serializable, bypassing cache"
                );
                None
            }
        }
    }

    // == Call ==
    /// Returns the cached result for `args`, computing and storing it on a miss.
    pub fn call<A>(&self, args: A) -> V
    where
        A: Serialize,
        F: Fn(A) -> V,
    {
        let Some(key) = self.key_for(&args) else {
            return (self.func)(args);
        };
        if let Some(value) = self.cache.get(&key) {
            return value;
        }

        debug!(namespace = %self.namespace, %key, "computing memoized value");
        let value = (self.func)(args);
        self.cache.set(key, value.clone(), self.ttl);
        value
    }

    // == Try Call ==
    /// Like [`call`](Self::call) for fallible functions. Errors are returned
    /// unchanged and never cached.
    pub fn try_call<A, E>(&self, args: A) -> Result<V, E>
    where
        A: Serialize,
        F: Fn(A) -> Result<V, E>,
    {
        let Some(key) = self.key_for(&args) else {
            return (self.func)(args);
        };
        if let Some(value) = self.cache.get(&key) {
            return Ok(value);
        }

        debug!(namespace = %self.namespace, %key, "computing memoized value");
        let value = (self.func)(args)?;
        self.cache.set(key, value.clone(), self.ttl);
        Ok(value)
    }

    // == Call Async ==
    /// Async counterpart of [`call`](Self::call).
    pub async fn call_async<A, Fut>(&self, args: A) -> V
    where
        A: Serialize,
        F: Fn(A) -> Fut,
        Fut: Future<Output = V>,
    {
        let Some(key) = self.key_for(&args) else {
            return (self.func)(args).await;
        };
        if let Some(value) = self.cache.get(&key) {
            return value;
        }

        debug!(namespace = %self.namespace, %key, "computing memoized value");
        let value = (self.func)(args).await;
        self.cache.set(key, value.clone(), self.ttl);
        value
    }

    /// Async counterpart of [`try_call`](Self::try_call).
    pub async fn try_call_async<A, Fut, E>(&self, args: A) -> Result<V, E>
    where
        A: Serialize,
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let Some(key) = self.key_for(&args) else {
            return (self.func)(args).await;
        };
        if let Some(value) = self.cache.get(&key) {
            return Ok(value);
        }

        debug!(namespace = %self.namespace, %key, "computing memoized value");
        let value = (self.func)(args).await?;
        self.cache.set(key, value.clone(), self.ttl);
        Ok(value)
    }

    /// Drops every stored result of this function.
    pub fn invalidate(&self) -> usize {
        self.cache.delete_namespace(&self.namespace)
    }
}
