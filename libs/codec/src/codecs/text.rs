use std::any::Any;

use esc_id::SerializedDataType;
use tracing::trace;

use super::charset_of;
use crate::charset::Charset;
use crate::contract::{BoxedValue, Deserializer, Input, Serializer};
use crate::error::SerializationError;
use crate::mime::MimeType;

const CODEC: &str = "text";

/// Codec for plain strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextCodec {
    mime_type: MimeType,
    charset: Charset,
}

impl TextCodec {
    /// `text/plain` in UTF-8.
    pub fn new() -> Self {
        Self::with_charset(Charset::Utf8)
    }

    pub fn with_charset(charset: Charset) -> Self {
        Self {
            mime_type: MimeType::text(charset),
            charset,
        }
    }

    pub fn charset(&self) -> Charset {
        self.charset
    }
}

impl Default for TextCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer for TextCodec {
    fn mime_type(&self) -> &MimeType {
        &self.mime_type
    }

    fn marshal(
        &self,
        value: &dyn Any,
        data_type: &SerializedDataType,
    ) -> Result<Vec<u8>, SerializationError> {
        let text = match (value.downcast_ref::<String>(), value.downcast_ref::<&str>()) {
            (Some(text), _) => text.as_str(),
            (None, Some(text)) => *text,
            (None, None) => {
                return Err(SerializationError::TypeMismatch {
                    codec: CODEC,
                    expected: "a string",
                })
            }
        };
        let bytes = self.charset.encode(text)?;
        trace!(%data_type, len = bytes.len(), "marshalled text");
        Ok(bytes)
    }
}

impl Deserializer for TextCodec {
    fn unmarshal(
        &self,
        input: Input<'_>,
        data_type: &SerializedDataType,
        mime_type: &MimeType,
    ) -> Result<BoxedValue, SerializationError> {
        let bytes = match input {
            Input::Native(value) if value.is::<String>() => return Ok(value),
            Input::Native(_) => {
                return Err(SerializationError::TypeMismatch {
                    codec: CODEC,
                    expected: "a string",
                })
            }
            Input::Bytes(bytes) => bytes,
        };
        if !mime_type.is_text() {
            return Err(SerializationError::UnsupportedMimeType {
                codec: CODEC,
                mime_type: mime_type.clone(),
            });
        }

        let text = charset_of(mime_type, self.charset)?.decode(bytes)?;
        trace!(%data_type, %mime_type, len = bytes.len(), "unmarshalled text");
        Ok(Box::new(text))
    }
}
