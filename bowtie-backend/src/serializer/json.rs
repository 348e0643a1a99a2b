use bytes::Bytes;

use super::{MessageSerializer, SerializerError};

/// JSON serializer (default).
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl MessageSerializer for JsonSerializer {
    fn with_serializer(
        &self,
        f: &mut dyn FnMut(&mut dyn erased_serde::Serializer) -> Result<(), SerializerError>,
    ) -> Result<Bytes, SerializerError> {
        let mut buf = Vec::new();
        let mut ser = serde_json::Serializer::new(&mut buf);
        let mut erased = <dyn erased_serde::Serializer>::erase(&mut ser);
        f(&mut erased)?;
        Ok(Bytes::from(buf))
    }

    fn with_deserializer(
        &self,
        data: &[u8],
        f: &mut dyn FnMut(&mut dyn erased_serde::Deserializer<'_>) -> Result<(), SerializerError>,
    ) -> Result<(), SerializerError> {
        let mut deser = serde_json::Deserializer::from_slice(data);
        let mut erased = <dyn erased_serde::Deserializer>::erase(&mut deser);
        f(&mut erased)?;
        drop(erased);
        deser
            .end()
            .map_err(|e| SerializerError::Deserialize(Box::new(e)))
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn clone_box(&self) -> Box<dyn MessageSerializer> {
        Box::new(*self)
    }
}
