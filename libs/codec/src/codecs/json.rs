use std::any::Any;

use esc_id::SerializedDataType;
use serde_json::Value;
use tracing::trace;

use super::charset_of;
use crate::charset::Charset;
use crate::contract::{BoxedValue, Deserializer, Input, Serializer};
use crate::error::SerializationError;
use crate::mime::MimeType;

const CODEC: &str = "json";

/// Codec for structured JSON values ([`serde_json::Value`]).
///
/// Only objects and arrays are accepted on marshal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonCodec {
    mime_type: MimeType,
    charset: Charset,
}

impl JsonCodec {
    /// `application/json` in UTF-8.
    pub fn new() -> Self {
        Self::with_charset(Charset::Utf8)
    }

    pub fn with_charset(charset: Charset) -> Self {
        Self {
            mime_type: MimeType::json(charset),
            charset,
        }
    }

    pub fn charset(&self) -> Charset {
        self.charset
    }
}

impl Default for JsonCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer for JsonCodec {
    fn mime_type(&self) -> &MimeType {
        &self.mime_type
    }

    fn marshal(
        &self,
        value: &dyn Any,
        data_type: &SerializedDataType,
    ) -> Result<Vec<u8>, SerializationError> {
        let value = value
            .downcast_ref::<Value>()
            .filter(|v| v.is_object() || v.is_array())
            .ok_or(SerializationError::TypeMismatch {
                codec: CODEC,
                expected: "a JSON object or array",
            })?;
        let bytes = self.charset.encode(&serde_json::to_string(value)?)?;
        trace!(%data_type, len = bytes.len(), "marshalled JSON");
        Ok(bytes)
    }
}

impl Deserializer for JsonCodec {
    fn unmarshal(
        &self,
        input: Input<'_>,
        data_type: &SerializedDataType,
        mime_type: &MimeType,
    ) -> Result<BoxedValue, SerializationError> {
        let bytes = match input {
            Input::Native(value) if value.is::<Value>() => return Ok(value),
            Input::Native(_) => {
                return Err(SerializationError::TypeMismatch {
                    codec: CODEC,
                    expected: "a JSON value",
                })
            }
            Input::Bytes(bytes) => bytes,
        };
        if !mime_type.is_json() {
            return Err(SerializationError::UnsupportedMimeType {
                codec: CODEC,
                mime_type: mime_type.clone(),
            });
        }

        let text = charset_of(mime_type, self.charset)?.decode(bytes)?;
        let value: Value = serde_json::from_str(&text)?;
        trace!(%data_type, %mime_type, len = bytes.len(), "unmarshalled JSON");
        Ok(Box::new(value))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn data_type() -> SerializedDataType {
        SerializedDataType::new("BookAdded").unwrap()
    }

    #[test]
    fn test_marshal_object() {
        let codec = JsonCodec::new();
        let bytes = codec.marshal(&json!({"name": "Shining"}), &data_type()).unwrap();
        assert_eq!(bytes, br#"{"name":"Shining"}"#);
        assert_eq!(codec.mime_type().to_string(), "application/json; encoding=UTF-8");
    }

    #[test]
    fn test_marshal_rejects_scalars_and_foreign_values() {
        let codec = JsonCodec::new();
        assert!(matches!(
            codec.marshal(&json!("Shining"), &data_type()),
            Err(SerializationError::TypeMismatch { .. })
        ));
        assert!(matches!(
            codec.marshal(&"Shining".to_string(), &data_type()),
            Err(SerializationError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_unmarshal_bytes() {
        let codec = JsonCodec::new();
        let value = codec
            .unmarshal(
                Input::Bytes(br#"{"name":"Shining"}"#),
                &data_type(),
                codec.mime_type(),
            )
            .unwrap();
        assert_eq!(value.downcast_ref::<Value>(), Some(&json!({"name": "Shining"})));
    }

    #[test]
    fn test_native_value_passes_through() {
        let codec = JsonCodec::new();
        let native = json!([1, 2, 3]);
        let value = codec
            .unmarshal(
                Input::Native(Box::new(native.clone())),
                &data_type(),
                codec.mime_type(),
            )
            .unwrap();
        assert_eq!(value.downcast_ref::<Value>(), Some(&native));
    }

    #[test]
    fn test_malformed_bytes() {
        let codec = JsonCodec::new();
        let err = codec
            .unmarshal(Input::Bytes(b"{\"name\":"), &data_type(), codec.mime_type())
            .unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_encoding_from_mime_type() {
        let codec = JsonCodec::new();
        let latin1 = MimeType::json(Charset::Iso8859_1);
        let value = codec
            .unmarshal(
                Input::Bytes(&[b'[', b'"', 0xE9, b'"', b']']),
                &data_type(),
                &latin1,
            )
            .unwrap();
        assert_eq!(value.downcast_ref::<Value>(), Some(&json!(["\u{e9}"])));
    }

    #[test]
    fn test_rejects_xml_mime_type() {
        let codec = JsonCodec::new();
        let err = codec
            .unmarshal(
                Input::Bytes(b"[]"),
                &data_type(),
                &MimeType::xml(Charset::Utf8),
            )
            .unwrap_err();
        assert!(matches!(err, SerializationError::UnsupportedMimeType { .. }));
    }
}
