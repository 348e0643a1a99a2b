use std::sync::Arc;

use async_trait::async_trait;
use bowtie_core::{CacheEntry, CacheKey};

use crate::StoreError;

pub type StoreResult<T> = Result<T, StoreError>;

/// Mapping from cache keys to stored responses.
///
/// Implementations must be safe for concurrent use: a `get` and a `put` for
/// the same key racing from different invocations may resolve in either
/// order, but must never leave a torn entry behind. Last write wins.
///
/// Eviction and expiry are the store's business; the engine only decides
/// what is eligible for storage.
#[async_trait]
pub trait CacheStore: Sync + Send {
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<CacheEntry>>;

    async fn put(&self, key: &CacheKey, entry: CacheEntry) -> StoreResult<()>;

    async fn invalidate(&self, key: &CacheKey) -> StoreResult<InvalidateStatus>;

    /// Returns the name of this store for log records.
    fn name(&self) -> &str {
        "store"
    }
}

/// Outcome of [`CacheStore::invalidate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidateStatus {
    /// An entry was present and has been removed.
    Removed,
    /// No entry was stored under the key.
    Missing,
}

#[async_trait]
impl CacheStore for &dyn CacheStore {
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<CacheEntry>> {
        (*self).get(key).await
    }

    async fn put(&self, key: &CacheKey, entry: CacheEntry) -> StoreResult<()> {
        (*self).put(key, entry).await
    }

    async fn invalidate(&self, key: &CacheKey) -> StoreResult<InvalidateStatus> {
        (*self).invalidate(key).await
    }

    fn name(&self) -> &str {
        (*self).name()
    }
}

#[async_trait]
impl CacheStore for Box<dyn CacheStore> {
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<CacheEntry>> {
        (**self).get(key).await
    }

    async fn put(&self, key: &CacheKey, entry: CacheEntry) -> StoreResult<()> {
        (**self).put(key, entry).await
    }

    async fn invalidate(&self, key: &CacheKey) -> StoreResult<InvalidateStatus> {
        (**self).invalidate(key).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl CacheStore for Arc<dyn CacheStore> {
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<CacheEntry>> {
        (**self).get(key).await
    }

    async fn put(&self, key: &CacheKey, entry: CacheEntry) -> StoreResult<()> {
        (**self).put(key, entry).await
    }

    async fn invalidate(&self, key: &CacheKey) -> StoreResult<InvalidateStatus> {
        (**self).invalidate(key).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
