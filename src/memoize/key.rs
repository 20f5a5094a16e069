//! Memoization Key Derivation
//!
//! Turns a namespace and a call's arguments into a bounded-length cache key
//! of the form `"{namespace}:{hash}"`.

use std::collections::BTreeMap;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::cache::NAMESPACE_DELIMITER;

/// Bytes of the SHA-256 digest kept in a key
const DIGEST_BYTES: usize = 16;

// == Key Builder ==
/// Accumulates positional and keyword arguments for one call.
///
/// Arguments are serialized to canonical JSON: object members are sorted, so
/// equal maps produce equal keys whatever their iteration order. An argument
/// that fails to serialize, or one added with [`resource`](Self::resource),
/// contributes an identity token derived from its address instead. The token
/// names the borrowed object, so it is only meaningful while the caller keeps
/// that object alive.
#[derive(Debug, Clone)]
pub struct KeyBuilder {
    namespace: String,
    positional: Vec<String>,
    keyword: BTreeMap<String, String>,
}

impl KeyBuilder {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            positional: Vec::new(),
            keyword: BTreeMap::new(),
        }
    }

    /// Adds a positional argument.
    pub fn arg<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.positional.push(serialize_or_identity(value));
        self
    }

    /// Adds a positional argument, failing instead of falling back to an
    /// identity token when it cannot be serialized.
    pub fn try_arg<T: Serialize + ?Sized>(mut self, value: &T) -> serde_json::Result<Self> {
        self.positional.push(canonical_json(value)?);
        Ok(self)
    }

    /// Adds a keyword argument. Order of keyword arguments does not matter.
    pub fn kwarg<T: Serialize + ?Sized>(mut self, name: impl Into<String>, value: &T) -> Self {
        self.keyword.insert(name.into(), serialize_or_identity(value));
        self
    }

    /// Adds a live resource (connection, session, handle) by identity only.
    ///
    /// Its contents are never read.
    pub fn resource<T: ?Sized>(mut self, value: &T) -> Self {
        self.positional.push(identity_token(value));
        self
    }

    // == Build ==
    /// Hashes the accumulated material into the final key.
    pub fn build(self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.namespace.as_bytes());
        for arg in &self.positional {
            hasher.update(b"\x1fp");
            hasher.update(arg.as_bytes());
        }
        for (name, value) in &self.keyword {
            hasher.update(b"\x1fk");
            hasher.update(name.as_bytes());
            hasher.update(b"=");
            hasher.update(value.as_bytes());
        }
        let hash = hex::encode(&hasher.finalize()[..DIGEST_BYTES]);

        format!("{}{}{}", self.namespace, NAMESPACE_DELIMITER, hash)
    }
}

/// JSON text with object members in sorted order.
///
/// Going through `serde_json::Value` sorts members, since its map is
/// `BTreeMap` backed.
fn canonical_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    let value = serde_json::to_value(value)?;
    serde_json::to_string(&value)
}

fn serialize_or_identity<T: Serialize + ?Sized>(value: &T) -> String {
    match canonical_json(value) {
        Ok(json) => json,
        Err(err) => {
            let token = identity_token(value);
            debug!(error = %err, %token, "argument not serializable, keying by identity");
            token
        }
    }
}

fn identity_token<T: ?Sized>(value: &T) -> String {
    format!("@{:p}", value as *const T as *const ())
}

// == Namespace Derivation ==
/// Derives a namespace from a function's type name.
///
/// Path separators become dots so the namespace holds no key delimiter:
/// `my_app::patterns::list` becomes `my_app.patterns.list`. Closures share the
/// name of their enclosing function, so memoized closures should be given an
/// explicit namespace.
pub fn derive_namespace<F: ?Sized>() -> String {
    std::any::type_name::<F>()
        .replace("::", ".")
        .replace(NAMESPACE_DELIMITER, ".")
}

/// Whether a derived namespace belongs to a closure rather than a named function.
pub(crate) fn is_closure_namespace(namespace: &str) -> bool {
    namespace.contains("{{closure}}")
}
