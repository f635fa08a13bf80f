//! Codec contracts.
//!
//! A [`Serializer`] turns a type-erased value into bytes for one wire format and
//! always reports the same [`MimeType`]. A [`Deserializer`] reverses this: it
//! accepts raw bytes, or a value that is already the codec's native in-memory
//! structure, which it hands back untouched.

use std::any::Any;
use std::fmt;

use esc_id::SerializedDataType;

use crate::error::SerializationError;
use crate::mime::MimeType;

/// A type-erased, thread-safe value produced by a deserializer.
pub type BoxedValue = Box<dyn Any + Send + Sync>;

/// Input of [`Deserializer::unmarshal`].
pub enum Input<'a> {
    /// Raw wire bytes to be parsed.
    Bytes(&'a [u8]),
    /// An already-parsed value, returned unchanged if it is the codec's native structure.
    Native(BoxedValue),
}

impl fmt::Debug for Input<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Input::Native(_) => f.write_str("Native(..)"),
        }
    }
}

impl<'a> From<&'a [u8]> for Input<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Input::Bytes(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for Input<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        Input::Bytes(bytes)
    }
}

/// Converts values of a logical type into bytes.
pub trait Serializer: Send + Sync + fmt::Debug {
    /// The mime type of every byte sequence this serializer produces.
    fn mime_type(&self) -> &MimeType;

    /// Serializes `value`, tagged as `data_type`.
    fn marshal(
        &self,
        value: &dyn Any,
        data_type: &SerializedDataType,
    ) -> Result<Vec<u8>, SerializationError>;
}

/// Converts bytes (or a native structure) of a logical type back into a value.
pub trait Deserializer: Send + Sync + fmt::Debug {
    fn unmarshal(
        &self,
        input: Input<'_>,
        data_type: &SerializedDataType,
        mime_type: &MimeType,
    ) -> Result<BoxedValue, SerializationError>;
}

/// A codec implementing both directions.
pub trait SerDeserializer: Serializer + Deserializer {}

impl<T: Serializer + Deserializer> SerDeserializer for T {}
