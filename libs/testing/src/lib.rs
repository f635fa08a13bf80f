//! Test fixtures shared by the esc crates.
//!
//! Only used from `tests/` directories, so the crates under test are linked once.

use std::sync::Arc;

use esc_codec::{
    BinaryCodec, JsonCodec, PayloadClass, SerializedDataTypeRegistry, SimpleSerDeserializerRegistry,
    SimpleSerializedDataTypeRegistry, TextCodec, TypedJsonCodec, XmlCodec,
};
use esc_id::SerializedDataType;
use serde::{Deserialize, Serialize};

/// Type bound to the schemaless JSON codec.
pub const BOOK_ADDED: &str = "BookAdded";
/// Type bound to the class-bound XML codec, written as a fragment.
pub const BOOK_ADDED_EVENT: &str = "BookAddedEvent";
/// Type bound to the class-bound JSON codec.
pub const BOOK_REMOVED: &str = "BookRemoved";
/// Type bound to the text codec.
pub const NOTE: &str = "Note";
/// Type bound to the binary codec.
pub const BLOB: &str = "Blob";
/// Metadata type bound to the schemaless JSON codec.
pub const AUDIT: &str = "Audit";

/// XML root element of [`BookAddedEvent`].
pub const BOOK_ADDED_EVENT_ROOT: &str = "book-added-event";

/// Payload written as XML attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookAddedEvent {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@author")]
    pub author: String,
}

impl BookAddedEvent {
    pub fn shining() -> Self {
        Self {
            name: "Shining".to_string(),
            author: "Stephen King".to_string(),
        }
    }
}

/// Payload written as a JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRemoved {
    pub name: String,
    pub reason: Option<String>,
}

pub fn data_type(name: &str) -> SerializedDataType {
    SerializedDataType::new(name).expect("fixture type names are valid")
}

/// Classes for [`BOOK_ADDED_EVENT`] and [`BOOK_REMOVED`].
pub fn data_type_registry() -> Arc<dyn SerializedDataTypeRegistry> {
    Arc::new(
        SimpleSerializedDataTypeRegistry::builder()
            .add(
                data_type(BOOK_ADDED_EVENT),
                PayloadClass::of::<BookAddedEvent>().with_xml_root(BOOK_ADDED_EVENT_ROOT),
            )
            .add_class::<BookRemoved>(data_type(BOOK_REMOVED))
            .build(),
    )
}

/// A registry with one default codec per fixture type.
pub fn codec_registry() -> SimpleSerDeserializerRegistry {
    let data_types = data_type_registry();
    SimpleSerDeserializerRegistry::builder()
        .add_default(data_type(BOOK_ADDED), Arc::new(JsonCodec::new()))
        .add_default(data_type(AUDIT), Arc::new(JsonCodec::new()))
        .add_default(
            data_type(BOOK_ADDED_EVENT),
            Arc::new(XmlCodec::new(data_types.clone()).fragment(true)),
        )
        .add_default(data_type(BOOK_REMOVED), Arc::new(TypedJsonCodec::new(data_types)))
        .add_default(data_type(NOTE), Arc::new(TextCodec::new()))
        .add_default(data_type(BLOB), Arc::new(BinaryCodec::new()))
        .build()
}

/// `{"name":"Shining"}`.
pub fn book_added_json() -> serde_json::Value {
    serde_json::json!({"name": "Shining"})
}

/// `{"user":"jdoe","correlation":"c-1"}`.
pub fn audit_json() -> serde_json::Value {
    serde_json::json!({"user": "jdoe", "correlation": "c-1"})
}
