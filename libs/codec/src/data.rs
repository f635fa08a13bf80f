//! The wire-level unit produced by a serializer.

use esc_id::SerializedDataType;

use crate::mime::MimeType;

/// A payload after serialization: logical type, mime type and bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SerializedData {
    data_type: SerializedDataType,
    mime_type: MimeType,
    data: Vec<u8>,
}

impl SerializedData {
    pub fn new(data_type: SerializedDataType, mime_type: MimeType, data: Vec<u8>) -> Self {
        Self {
            data_type,
            mime_type,
            data,
        }
    }

    pub fn data_type(&self) -> &SerializedDataType {
        &self.data_type
    }

    pub fn mime_type(&self) -> &MimeType {
        &self.mime_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Splits into its parts.
    pub fn into_parts(self) -> (SerializedDataType, MimeType, Vec<u8>) {
        (self.data_type, self.mime_type, self.data)
    }
}
