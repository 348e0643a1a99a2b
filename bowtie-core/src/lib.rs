//! # bowtie-core
//!
//! Core types for the bowtie declarative REST client.
//!
//! This crate holds everything the invocation engine needs to decide about
//! caching without knowing how requests are sent or where entries live:
//!
//! - **Decide** whether an exchange may be cached ([`RestCachingPolicy`])
//! - **Parse** `Cache-Control` values ([`CacheControlDirectives`])
//! - **Derive** cache keys ([`key::derive_key`])
//! - **Snapshot** responses for storage ([`CacheEntry`])
//! - **Send** requests through a pluggable [`Transport`], wrapped by [`Filter`]s
//!
//! Storage and serialization capabilities live in `bowtie-backend`.

pub mod directives;
pub mod entry;
pub mod key;
pub mod policy;
pub mod request;
pub mod response;
pub mod transport;

pub use directives::{CacheControlDirectives, Directive};
pub use entry::CacheEntry;
pub use key::{CacheKey, KeyError, KeyPart, derive_key};
pub use policy::{CACHEABLE_STATUSES, PolicyMode, RestCachingPolicy};
pub use request::HttpRequest;
pub use response::HttpResponse;
pub use transport::{Filter, Transport, TransportError};

/// Raw byte data used for request and response bodies.
pub type Raw = bytes::Bytes;
