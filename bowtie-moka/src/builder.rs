//! Builder for configuring [`MokaStore`].

use std::time::{Duration, Instant};

use bowtie_core::{CacheEntry, CacheKey};
use moka::Expiry;
use moka::future::{Cache, CacheBuilder};
use moka::policy::EvictionPolicy;
use smol_str::SmolStr;

use crate::store::MokaStore;

/// Fixed per-entry overhead added by the byte weigher for the key, status
/// and bookkeeping.
const ENTRY_OVERHEAD: usize = 128;

/// Custom expiration policy that calculates TTL from [`CacheEntry::ttl`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Expiration;

impl Expiry<CacheKey, CacheEntry> for Expiration {
    fn expire_after_create(
        &self,
        _key: &CacheKey,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl()
    }

    fn expire_after_update(
        &self,
        _key: &CacheKey,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        // Always use the NEW entry's lifetime. Moka's default keeps the old one.
        value.ttl()
    }
}

/// Marker type: capacity has not been configured yet.
///
/// You must call either [`max_entries()`](MokaStoreBuilder::max_entries) or
/// [`max_bytes()`](MokaStoreBuilder::max_bytes) before calling `build()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapacity;

/// Marker type: entry-count capacity has been configured.
#[derive(Debug, Clone, Copy)]
pub struct EntryCapacity(pub(crate) u64);

/// Marker type: byte-based capacity has been configured.
#[derive(Debug, Clone, Copy)]
pub struct ByteCapacity(pub(crate) u64);

/// Builder for creating and configuring a [`MokaStore`].
///
/// Capacity is mandatory and uses the typestate pattern: `build()` only
/// exists after [`max_entries`](Self::max_entries) or
/// [`max_bytes`](Self::max_bytes) has been called, and the two are mutually
/// exclusive.
///
/// ```
/// use bowtie_moka::{EvictionPolicy, MokaStore};
///
/// let store = MokaStore::builder()
///     .label("users")
///     .max_bytes(16 * 1024 * 1024)
///     .eviction_policy(EvictionPolicy::tiny_lfu())
///     .build();
/// ```
pub struct MokaStoreBuilder<Cap> {
    capacity: Cap,
    label: SmolStr,
    eviction_policy: Option<EvictionPolicy>,
}

impl MokaStoreBuilder<NoCapacity> {
    pub fn new() -> Self {
        Self {
            capacity: NoCapacity,
            label: SmolStr::new_static("moka"),
            eviction_policy: None,
        }
    }

    /// Sets the maximum number of entries the cache can hold.
    pub fn max_entries(self, capacity: u64) -> MokaStoreBuilder<EntryCapacity> {
        MokaStoreBuilder {
            capacity: EntryCapacity(capacity),
            label: self.label,
            eviction_policy: self.eviction_policy,
        }
    }

    /// Sets the approximate memory budget in bytes.
    ///
    /// Each entry weighs its body, header names and values, key, plus a
    /// fixed overhead.
    pub fn max_bytes(self, bytes: u64) -> MokaStoreBuilder<ByteCapacity> {
        MokaStoreBuilder {
            capacity: ByteCapacity(bytes),
            label: self.label,
            eviction_policy: self.eviction_policy,
        }
    }
}

impl Default for MokaStoreBuilder<NoCapacity> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Cap> MokaStoreBuilder<Cap> {
    /// Name reported by [`CacheStore::name`](bowtie_backend::CacheStore::name).
    ///
    /// # Default
    ///
    /// `"moka"`
    pub fn label(mut self, label: impl Into<SmolStr>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the eviction policy.
    ///
    /// Defaults to [`EvictionPolicy::tiny_lfu()`] for entry capacity and
    /// [`EvictionPolicy::lru()`] for byte capacity.
    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = Some(policy);
        self
    }
}

impl MokaStoreBuilder<EntryCapacity> {
    pub fn build(self) -> MokaStore {
        let policy = self
            .eviction_policy
            .unwrap_or_else(EvictionPolicy::tiny_lfu);
        let cache: Cache<CacheKey, CacheEntry> = CacheBuilder::new(self.capacity.0)
            .name(self.label.as_str())
            .eviction_policy(policy)
            .expire_after(Expiration)
            .build();
        MokaStore::from_parts(cache, self.label)
    }
}

impl MokaStoreBuilder<ByteCapacity> {
    /// Builds a store bounded by weighted size.
    ///
    /// Defaults to LRU: TinyLFU admission can reject new weighted entries even
    /// when eviction could make room.
    pub fn build(self) -> MokaStore {
        let policy = self.eviction_policy.unwrap_or_else(EvictionPolicy::lru);
        let cache: Cache<CacheKey, CacheEntry> = CacheBuilder::new(self.capacity.0)
            .name(self.label.as_str())
            .weigher(byte_weigher)
            .eviction_policy(policy)
            .expire_after(Expiration)
            .build();
        MokaStore::from_parts(cache, self.label)
    }
}

fn byte_weigher(key: &CacheKey, entry: &CacheEntry) -> u32 {
    let headers: usize = entry
        .headers()
        .iter()
        .map(|(name, value)| name.as_str().len() + value.len())
        .sum();
    let size = key.as_str().len() + entry.cached_bytes().len() + headers + ENTRY_OVERHEAD;
    size.min(u32::MAX as usize) as u32
}
