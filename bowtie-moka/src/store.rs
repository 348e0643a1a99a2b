//! Moka store implementation.

use async_trait::async_trait;
use bowtie_backend::{CacheStore, InvalidateStatus, StoreResult};
use bowtie_core::{CacheEntry, CacheKey};
use moka::future::Cache;
use smol_str::SmolStr;
use tracing::debug;

use crate::builder::{MokaStoreBuilder, NoCapacity};

/// In-memory cache store powered by Moka.
///
/// `MokaStore` provides a concurrent in-memory cache with per-entry
/// expiration taken from [`CacheEntry::expires_at`]. Entries without an
/// expiry live until evicted for capacity.
///
/// # Examples
///
/// ```
/// use bowtie_moka::MokaStore;
///
/// let store = MokaStore::builder().max_entries(10_000).build();
/// ```
///
/// # Caveats
///
/// - Data is **not persisted**; the cache is lost on process restart
/// - Data is **not shared** across processes
/// - Expiration is **best-effort** inside Moka; [`get`](CacheStore::get)
///   additionally refuses entries whose expiry has passed
#[derive(Clone)]
pub struct MokaStore {
    cache: Cache<CacheKey, CacheEntry>,
    label: SmolStr,
}

impl std::fmt::Debug for MokaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaStore")
            .field("label", &self.label)
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl MokaStore {
    /// Creates a new builder. Capacity must be set before building.
    pub fn builder() -> MokaStoreBuilder<NoCapacity> {
        MokaStoreBuilder::new()
    }

    pub(crate) fn from_parts(cache: Cache<CacheKey, CacheEntry>, label: SmolStr) -> Self {
        MokaStore { cache, label }
    }

    /// Underlying Moka cache, mainly for running pending maintenance in tests.
    pub fn cache(&self) -> &Cache<CacheKey, CacheEntry> {
        &self.cache
    }
}

#[async_trait]
impl CacheStore for MokaStore {
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<CacheEntry>> {
        match self.cache.get(key).await {
            Some(entry) if entry.is_expired() => {
                debug!(%key, store = %self.label, "cached entry expired");
                self.cache.invalidate(key).await;
                Ok(None)
            }
            entry => Ok(entry),
        }
    }

    async fn put(&self, key: &CacheKey, entry: CacheEntry) -> StoreResult<()> {
        self.cache.insert(key.clone(), entry).await;
        Ok(())
    }

    async fn invalidate(&self, key: &CacheKey) -> StoreResult<InvalidateStatus> {
        match self.cache.remove(key).await {
            Some(_) => Ok(InvalidateStatus::Removed),
            None => Ok(InvalidateStatus::Missing),
        }
    }

    fn name(&self) -> &str {
        &self.label
    }
}
