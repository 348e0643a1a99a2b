//! Message serializer capability.
//!
//! A [`MessageSerializer`] turns request bodies into bytes and response bytes
//! into domain values. The trait is object-safe (it works through
//! `erased_serde`), so an adapter can hold any serializer as
//! `Arc<dyn MessageSerializer>`; the generic `serialize`/`deserialize`
//! helpers come from the blanket [`SerializerExt`] implementation.

use bytes::Bytes;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

mod json;

pub use json::JsonSerializer;

#[derive(Error, Debug)]
pub enum SerializerError {
    #[error(transparent)]
    Serialize(Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Deserialize(Box<dyn std::error::Error + Send + Sync>),
}

/// Object-safe serializer trait.
pub trait MessageSerializer: std::fmt::Debug + Send + Sync {
    /// Provides access to a serializer via a callback to avoid lifetime issues.
    fn with_serializer(
        &self,
        f: &mut dyn FnMut(&mut dyn erased_serde::Serializer) -> Result<(), SerializerError>,
    ) -> Result<Bytes, SerializerError>;

    /// Provides access to a deserializer over `data` via a callback.
    fn with_deserializer(
        &self,
        data: &[u8],
        f: &mut dyn FnMut(&mut dyn erased_serde::Deserializer<'_>) -> Result<(), SerializerError>,
    ) -> Result<(), SerializerError>;

    /// Value sent as `Content-Type` for serialized bodies and as `Accept`.
    fn content_type(&self) -> &'static str;

    /// Clone this serializer into a box (for object safety).
    fn clone_box(&self) -> Box<dyn MessageSerializer>;
}

/// Generic helpers, implemented for every [`MessageSerializer`].
pub trait SerializerExt: MessageSerializer {
    fn serialize<T>(&self, value: &T) -> Result<Bytes, SerializerError>
    where
        T: Serialize,
    {
        self.with_serializer(&mut |serializer| {
            let erased = value as &dyn erased_serde::Serialize;
            erased
                .erased_serialize(serializer)
                .map_err(|e| SerializerError::Serialize(Box::new(e)))
        })
    }

    fn deserialize<T>(&self, data: &[u8]) -> Result<T, SerializerError>
    where
        T: DeserializeOwned,
    {
        let mut result: Option<T> = None;
        self.with_deserializer(data, &mut |deserializer| {
            let value: T = erased_serde::deserialize(deserializer)
                .map_err(|e| SerializerError::Deserialize(Box::new(e)))?;
            result = Some(value);
            Ok(())
        })?;

        result.ok_or_else(|| {
            SerializerError::Deserialize(Box::new(std::io::Error::other(
                "deserialization produced no result",
            )))
        })
    }
}

impl<T: MessageSerializer + ?Sized> SerializerExt for T {}

impl Clone for Box<dyn MessageSerializer> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl MessageSerializer for Box<dyn MessageSerializer> {
    fn with_serializer(
        &self,
        f: &mut dyn FnMut(&mut dyn erased_serde::Serializer) -> Result<(), SerializerError>,
    ) -> Result<Bytes, SerializerError> {
        (**self).with_serializer(f)
    }

    fn with_deserializer(
        &self,
        data: &[u8],
        f: &mut dyn FnMut(&mut dyn erased_serde::Deserializer<'_>) -> Result<(), SerializerError>,
    ) -> Result<(), SerializerError> {
        (**self).with_deserializer(data, f)
    }

    fn content_type(&self) -> &'static str {
        (**self).content_type()
    }

    fn clone_box(&self) -> Box<dyn MessageSerializer> {
        (**self).clone_box()
    }
}

impl MessageSerializer for std::sync::Arc<dyn MessageSerializer> {
    fn with_serializer(
        &self,
        f: &mut dyn FnMut(&mut dyn erased_serde::Serializer) -> Result<(), SerializerError>,
    ) -> Result<Bytes, SerializerError> {
        (**self).with_serializer(f)
    }

    fn with_deserializer(
        &self,
        data: &[u8],
        f: &mut dyn FnMut(&mut dyn erased_serde::Deserializer<'_>) -> Result<(), SerializerError>,
    ) -> Result<(), SerializerError> {
        (**self).with_deserializer(data, f)
    }

    fn content_type(&self) -> &'static str {
        (**self).content_type()
    }

    fn clone_box(&self) -> Box<dyn MessageSerializer> {
        (**self).clone_box()
    }
}
