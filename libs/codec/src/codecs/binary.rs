use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use esc_id::SerializedDataType;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::contract::{BoxedValue, Deserializer, Input, Serializer};
use crate::error::SerializationError;
use crate::mime::MimeType;

const CODEC: &str = "binary";

/// Binary content carried as base64 text.
///
/// Built from bytes, the text is encoded eagerly with the standard alphabet and
/// no line wrapping, so equal bytes always give equal text. Built from text, the
/// bytes are decoded on first access and cached. Equality and hashing use the
/// text.
#[derive(Clone)]
pub struct Base64Payload {
    encoded: String,
    decoded: OnceLock<Vec<u8>>,
}

impl Base64Payload {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        Self {
            encoded: STANDARD.encode(&bytes),
            decoded: OnceLock::from(bytes),
        }
    }

    /// Wraps base64 text without decoding it.
    pub fn from_base64(encoded: impl Into<String>) -> Self {
        Self {
            encoded: encoded.into(),
            decoded: OnceLock::new(),
        }
    }

    pub fn as_base64(&self) -> &str {
        &self.encoded
    }

    pub fn into_base64(self) -> String {
        self.encoded
    }

    /// Decoded bytes, decoding and caching them on first call.
    pub fn bytes(&self) -> Result<&[u8], base64::DecodeError> {
        if let Some(bytes) = self.decoded.get() {
            return Ok(bytes.as_slice());
        }
        let bytes = STANDARD.decode(&self.encoded)?;
        Ok(self.decoded.get_or_init(|| bytes).as_slice())
    }

    /// True once the bytes are known without decoding.
    pub fn is_decoded(&self) -> bool {
        self.decoded.get().is_some()
    }
}

impl fmt::Debug for Base64Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Base64Payload").field(&self.encoded).finish()
    }
}

impl fmt::Display for Base64Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

impl PartialEq for Base64Payload {
    fn eq(&self, other: &Self) -> bool {
        self.encoded == other.encoded
    }
}

impl Eq for Base64Payload {}

impl Hash for Base64Payload {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.encoded.hash(state);
    }
}

impl From<Vec<u8>> for Base64Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<&[u8]> for Base64Payload {
    fn from(bytes: &[u8]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl Serialize for Base64Payload {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encoded)
    }
}

impl<'de> Deserialize<'de> for Base64Payload {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Ok(Self::from_base64(encoded))
    }
}

/// Codec for opaque bytes.
///
/// Accepts `Vec<u8>` and [`Base64Payload`] on marshal and produces `Vec<u8>` on
/// unmarshal. The bytes are copied as-is, so any mime type is accepted on read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryCodec {
    mime_type: MimeType,
}

impl BinaryCodec {
    /// `application/octet-stream`.
    pub fn new() -> Self {
        Self {
            mime_type: MimeType::octet_stream(),
        }
    }

    /// A binary codec reporting another mime type, e.g. `application/protobuf`.
    pub fn with_mime_type(mime_type: MimeType) -> Self {
        Self { mime_type }
    }
}

impl Default for BinaryCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer for BinaryCodec {
    fn mime_type(&self) -> &MimeType {
        &self.mime_type
    }

    fn marshal(
        &self,
        value: &dyn Any,
        data_type: &SerializedDataType,
    ) -> Result<Vec<u8>, SerializationError> {
        let bytes = if let Some(bytes) = value.downcast_ref::<Vec<u8>>() {
            bytes.clone()
        } else if let Some(payload) = value.downcast_ref::<Base64Payload>() {
            payload
                .bytes()
                .map_err(|e| SerializationError::malformed("base64", e))?
                .to_vec()
        } else {
            return Err(SerializationError::TypeMismatch {
                codec: CODEC,
                expected: "bytes or a base64 payload",
            });
        };
        trace!(%data_type, len = bytes.len(), "marshalled binary");
        Ok(bytes)
    }
}

impl Deserializer for BinaryCodec {
    fn unmarshal(
        &self,
        input: Input<'_>,
        data_type: &SerializedDataType,
        mime_type: &MimeType,
    ) -> Result<BoxedValue, SerializationError> {
        match input {
            Input::Native(value) if value.is::<Vec<u8>>() || value.is::<Base64Payload>() => {
                Ok(value)
            }
            Input::Native(_) => Err(SerializationError::TypeMismatch {
                codec: CODEC,
                expected: "bytes or a base64 payload",
            }),
            Input::Bytes(bytes) => {
                trace!(%data_type, %mime_type, len = bytes.len(), "unmarshalled binary");
                Ok(Box::new(bytes.to_vec()))
            }
        }
    }
}
