//! Cache key derivation.
//!
//! A [`CacheKey`] identifies one cached response. It is scoped by a
//! namespace (the cache name declared on a method), the bound request path,
//! and an optional set of discriminating parameters.
//!
//! ## Format
//!
//! - `{namespace}:{path}` when there are no discriminating parameters
//! - `{namespace}:{path}?{name}={value}&...` otherwise, with parameters sorted
//!   by name then value and form-urlencoded
//!
//! ```
//! use bowtie_core::key::derive_key;
//!
//! let key = derive_key("userCache", "/user/bdoe", Vec::<(&str, &str)>::new()).unwrap();
//! assert_eq!(key.as_str(), "userCache:/user/bdoe");
//!
//! let key = derive_key("users", "/user", [("byUsername", "jdoe"), ("bySystem", "email")]).unwrap();
//! assert_eq!(key.as_str(), "users:/user?bySystem=email&byUsername=jdoe");
//! ```
//!
//! Sorting makes the key independent of argument order, so identical inputs
//! yield identical keys across process runs.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use smol_str::SmolStr;
use thiserror::Error;
use url::form_urlencoded;

/// Why a key could not be derived.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// Namespace or path was empty.
    #[error("invalid cache key input: {0}")]
    InvalidKeyInput(&'static str),
}

/// One discriminating parameter of a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyPart {
    name: SmolStr,
    value: SmolStr,
}

impl KeyPart {
    pub fn new(name: impl Into<SmolStr>, value: impl Into<SmolStr>) -> Self {
        KeyPart {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

#[derive(Debug, PartialEq, Eq)]
struct CacheKeyInner {
    namespace: SmolStr,
    path: String,
    parts: Vec<KeyPart>,
    rendered: String,
}

/// A derived cache key.
///
/// Wraps its data in an [`Arc`] so that clones handed to stores and log
/// statements only bump a reference count.
#[derive(Clone, Debug)]
pub struct CacheKey {
    inner: Arc<CacheKeyInner>,
}

impl CacheKey {
    /// Rendered key, e.g. `userCache:/user/bdoe`.
    pub fn as_str(&self) -> &str {
        &self.inner.rendered
    }

    pub fn namespace(&self) -> &str {
        &self.inner.namespace
    }

    pub fn path(&self) -> &str {
        &self.inner.path
    }

    /// Discriminating parameters in key order.
    pub fn parts(&self) -> impl Iterator<Item = &KeyPart> {
        self.inner.parts.iter()
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner.rendered == other.inner.rendered
    }
}

impl Eq for CacheKey {}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.rendered.hash(state);
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.rendered)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Builds a deterministic key from a namespace, a bound path and
/// discriminating parameters.
pub fn derive_key<I, K, V>(
    namespace: &str,
    path: &str,
    discriminating: I,
) -> Result<CacheKey, KeyError>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<SmolStr>,
    V: Into<SmolStr>,
{
    if namespace.is_empty() {
        return Err(KeyError::InvalidKeyInput("namespace is empty"));
    }
    if path.is_empty() {
        return Err(KeyError::InvalidKeyInput("path is empty"));
    }

    let mut parts: Vec<KeyPart> = discriminating
        .into_iter()
        .map(|(name, value)| KeyPart::new(name, value))
        .collect();
    parts.sort();

    let mut rendered = String::with_capacity(namespace.len() + path.len() + 1);
    rendered.push_str(namespace);
    rendered.push(':');
    rendered.push_str(path);
    if !parts.is_empty() {
        let mut query = form_urlencoded::Serializer::new(String::new());
        for part in &parts {
            query.append_pair(part.name(), part.value());
        }
        rendered.push('?');
        rendered.push_str(&query.finish());
    }

    Ok(CacheKey {
        inner: Arc::new(CacheKeyInner {
            namespace: SmolStr::new(namespace),
            path: path.to_owned(),
            parts,
            rendered,
        }),
    })
}
