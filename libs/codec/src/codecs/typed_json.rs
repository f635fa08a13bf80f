use std::any::Any;
use std::sync::Arc;

use esc_id::SerializedDataType;
use serde_json::Value;
use tracing::trace;

use super::charset_of;
use crate::charset::Charset;
use crate::contract::{BoxedValue, Deserializer, Input, Serializer};
use crate::error::SerializationError;
use crate::mime::MimeType;
use crate::registry::SerializedDataTypeRegistry;

const CODEC: &str = "typed-json";

/// JSON codec bound to the classes of a [`SerializedDataTypeRegistry`].
///
/// Marshal refuses values that are not instances of the class registered for
/// their type tag, so a misconfigured registry cannot store data under the wrong
/// type. Unmarshal produces an instance of that class.
#[derive(Debug, Clone)]
pub struct TypedJsonCodec {
    registry: Arc<dyn SerializedDataTypeRegistry>,
    mime_type: MimeType,
    charset: Charset,
}

impl TypedJsonCodec {
    /// `application/json` in UTF-8.
    pub fn new(registry: Arc<dyn SerializedDataTypeRegistry>) -> Self {
        Self::with_charset(registry, Charset::Utf8)
    }

    pub fn with_charset(registry: Arc<dyn SerializedDataTypeRegistry>, charset: Charset) -> Self {
        Self {
            registry,
            mime_type: MimeType::json(charset),
            charset,
        }
    }
}

impl Serializer for TypedJsonCodec {
    fn mime_type(&self) -> &MimeType {
        &self.mime_type
    }

    fn marshal(
        &self,
        value: &dyn Any,
        data_type: &SerializedDataType,
    ) -> Result<Vec<u8>, SerializationError> {
        let class = self.registry.find_class(data_type)?;
        if !class.is_instance(value) {
            return Err(SerializationError::NotAssignable {
                data_type: data_type.clone(),
                class: class.type_name(),
            });
        }

        let json = class
            .to_json(value)
            .map_err(|e| SerializationError::codec(CODEC, e))?;
        let bytes = self.charset.encode(&json)?;
        trace!(%data_type, class = class.type_name(), len = bytes.len(), "marshalled typed JSON");
        Ok(bytes)
    }
}

impl Deserializer for TypedJsonCodec {
    fn unmarshal(
        &self,
        input: Input<'_>,
        data_type: &SerializedDataType,
        mime_type: &MimeType,
    ) -> Result<BoxedValue, SerializationError> {
        let class = self.registry.find_class(data_type)?;
        let bytes = match input {
            Input::Native(value) if class.is_instance(&*value) => return Ok(value),
            Input::Native(value) => {
                let json = value
                    .downcast::<Value>()
                    .map_err(|_| SerializationError::TypeMismatch {
                        codec: CODEC,
                        expected: "an instance of the registered class or a JSON value",
                    })?;
                return class
                    .from_json_value(*json)
                    .map_err(|e| SerializationError::malformed("json", e));
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
        let value = class
            .from_json(&text)
            .map_err(|e| SerializationError::malformed("json", e))?;
        trace!(%data_type, class = class.type_name(), len = bytes.len(), "unmarshalled typed JSON");
        Ok(value)
    }
}
