//! Adapter configuration.
//!
//! [`AdapterConfig`] bundles the collaborators an adapter consumes: the
//! message serializer, the wire encoding, an optional cache store, ordered
//! filters and the caching policy. It is read-only once built and shared by
//! every proxy the adapter creates.

use std::fmt;
use std::sync::Arc;

use bowtie_backend::{CacheStore, Encoding, JsonSerializer, MessageSerializer};
use bowtie_core::{Filter, PolicyMode, RestCachingPolicy};

/// Read-only configuration consumed by the invocation engine.
///
/// # Example
///
/// ```
/// use bowtie::AdapterConfig;
/// use bowtie_backend::Encoding;
/// use bowtie_moka::MokaStore;
///
/// let config = AdapterConfig::builder()
///     .encoding(Encoding::Gzip)
///     .store(MokaStore::builder().max_entries(1_000).build())
///     .build();
/// assert!(config.store().is_some());
/// ```
#[derive(Clone)]
pub struct AdapterConfig {
    serializer: Arc<dyn MessageSerializer>,
    encoding: Encoding,
    store: Option<Arc<dyn CacheStore>>,
    filters: Vec<Arc<dyn Filter>>,
    policy: RestCachingPolicy,
}

impl AdapterConfig {
    pub fn builder() -> AdapterConfigBuilder {
        AdapterConfigBuilder::default()
    }

    #[inline]
    pub fn serializer(&self) -> &dyn MessageSerializer {
        self.serializer.as_ref()
    }

    #[inline]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    #[inline]
    pub fn store(&self) -> Option<&Arc<dyn CacheStore>> {
        self.store.as_ref()
    }

    /// Filters in the order their request hooks run.
    #[inline]
    pub fn filters(&self) -> &[Arc<dyn Filter>] {
        &self.filters
    }

    #[inline]
    pub fn policy(&self) -> &RestCachingPolicy {
        &self.policy
    }

    pub(crate) fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub(crate) fn with_policy_mode(mut self, mode: PolicyMode) -> Self {
        self.policy = RestCachingPolicy::new(mode);
        self
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        AdapterConfig::builder().build()
    }
}

impl fmt::Debug for AdapterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterConfig")
            .field("serializer", &self.serializer)
            .field("encoding", &self.encoding)
            .field("store", &self.store.as_ref().map(|store| store.name()))
            .field("filters", &self.filters.len())
            .field("policy", &self.policy)
            .finish()
    }
}

/// Builder for [`AdapterConfig`].
///
/// Defaults to [`JsonSerializer`], no encoding, no cache store, no filters
/// and the strict caching policy.
pub struct AdapterConfigBuilder {
    serializer: Arc<dyn MessageSerializer>,
    encoding: Encoding,
    store: Option<Arc<dyn CacheStore>>,
    filters: Vec<Arc<dyn Filter>>,
    policy: RestCachingPolicy,
}

impl Default for AdapterConfigBuilder {
    fn default() -> Self {
        AdapterConfigBuilder {
            serializer: Arc::new(JsonSerializer),
            encoding: Encoding::None,
            store: None,
            filters: Vec::new(),
            policy: RestCachingPolicy::default(),
        }
    }
}

impl AdapterConfigBuilder {
    pub fn serializer<S>(mut self, serializer: S) -> Self
    where
        S: MessageSerializer + 'static,
    {
        self.serializer = Arc::new(serializer);
        self
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn store<S>(self, store: S) -> Self
    where
        S: CacheStore + 'static,
    {
        self.shared_store(Arc::new(store))
    }

    /// Uses a store that is also held elsewhere, e.g. by several adapters.
    pub fn shared_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Appends a filter. Request hooks run in insertion order, response hooks
    /// in reverse.
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Filter + 'static,
    {
        self.filters.push(Arc::new(filter));
        self
    }

    pub fn policy(mut self, policy: RestCachingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> AdapterConfig {
        AdapterConfig {
            serializer: self.serializer,
            encoding: self.encoding,
            store: self.store,
            filters: self.filters,
            policy: self.policy,
        }
    }
}
