//! Capabilities the bowtie invocation engine consumes but does not implement
//! itself: where cached responses live ([`CacheStore`]), how bodies are
//! (de)serialized ([`MessageSerializer`]) and how they are encoded on the
//! wire ([`Encoding`]).
//!
//! If you want to implement your own store, you are in the right place.
pub mod encoding;
mod error;
pub mod serializer;
mod store;

pub use encoding::{Encoding, EncodingError};
pub use error::StoreError;
pub use serializer::{JsonSerializer, MessageSerializer, SerializerError, SerializerExt};
pub use store::{CacheStore, InvalidateStatus, StoreResult};
