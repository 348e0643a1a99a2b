//! In-memory [`CacheStore`](bowtie_backend::CacheStore) for bowtie built on
//! [Moka](https://docs.rs/moka).
//!
//! ```
//! use std::sync::Arc;
//! use bowtie_backend::CacheStore;
//! use bowtie_moka::MokaStore;
//!
//! let store: Arc<dyn CacheStore> = Arc::new(MokaStore::builder().max_entries(1_000).build());
//! assert_eq!(store.name(), "moka");
//! ```

mod builder;
mod store;

pub use builder::{ByteCapacity, EntryCapacity, MokaStoreBuilder, NoCapacity};
pub use moka::policy::EvictionPolicy;
pub use store::MokaStore;
