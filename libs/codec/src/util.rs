//! Serialization through registries.

use std::any::{type_name, Any};

use esc_id::SerializedDataType;
use tracing::trace;

use crate::contract::{BoxedValue, Input};
use crate::data::SerializedData;
use crate::error::SerializationError;
use crate::mime::MimeType;
use crate::registry::{DeserializerRegistry, SerializerRegistry};

/// Serializes `value` with the serializer registered for `data_type`.
///
/// Returns `Ok(None)` only when there is no value. A missing serializer is an
/// error.
pub fn serialize<R>(
    registry: &R,
    data_type: &SerializedDataType,
    value: Option<&dyn Any>,
) -> Result<Option<SerializedData>, SerializationError>
where
    R: SerializerRegistry + ?Sized,
{
    let Some(value) = value else {
        return Ok(None);
    };
    let serializer = registry.get_serializer(data_type)?;
    let bytes = serializer.marshal(value, data_type)?;
    trace!(%data_type, mime_type = %serializer.mime_type(), len = bytes.len(), "serialized");
    Ok(Some(SerializedData::new(
        data_type.clone(),
        serializer.mime_type().clone(),
        bytes,
    )))
}

/// Deserializes `data` with the deserializer registered for its type and mime type.
pub fn deserialize<R>(registry: &R, data: &SerializedData) -> Result<BoxedValue, SerializationError>
where
    R: DeserializerRegistry + ?Sized,
{
    let deserializer = registry.get_deserializer(data.data_type(), Some(data.mime_type()))?;
    let value = deserializer.unmarshal(Input::Bytes(data.data()), data.data_type(), data.mime_type())?;
    trace!(data_type = %data.data_type(), mime_type = %data.mime_type(), "deserialized");
    Ok(value)
}

/// Like [`deserialize`], then downcasts the value to `T`.
pub fn deserialize_as<T, R>(registry: &R, data: &SerializedData) -> Result<T, SerializationError>
where
    T: Any,
    R: DeserializerRegistry + ?Sized,
{
    deserialize(registry, data)?
        .downcast::<T>()
        .map(|value| *value)
        .map_err(|_| SerializationError::TypeMismatch {
            codec: "registry",
            expected: type_name::<T>(),
        })
}

/// The mime type produced by the serializers of every type in `data_types`.
///
/// Returns `Ok(None)` if the serializers disagree or there are no types. A type
/// without a serializer is an error.
pub fn common_mime_type<'a, R, I>(
    registry: &R,
    data_types: I,
) -> Result<Option<MimeType>, SerializationError>
where
    R: SerializerRegistry + ?Sized,
    I: IntoIterator<Item = &'a SerializedDataType>,
{
    let mut common: Option<MimeType> = None;
    for data_type in data_types {
        let serializer = registry.get_serializer(data_type)?;
        match &common {
            None => common = Some(serializer.mime_type().clone()),
            Some(mime_type) if mime_type == serializer.mime_type() => {}
            Some(_) => return Ok(None),
        }
    }
    Ok(common)
}
