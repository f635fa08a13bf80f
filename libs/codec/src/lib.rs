//! # esc-codec
//!
//! Mime types, codec contracts, registries and the concrete codecs that turn
//! event payloads into bytes and back.
//!
//! ## Design Principles
//!
//! - Every byte sequence is tagged with a logical type and a [`MimeType`]
//! - Registries are built once through a builder and then shared read-only
//! - A missing registry entry is always an error, never a silent `None`
//! - Deserializers hand back already-parsed native structures untouched
//!
//! ## Codecs
//!
//! - [`JsonCodec`]: `application/json`, native structure [`serde_json::Value`]
//! - [`TextCodec`]: `text/plain`, native structure [`String`]
//! - [`BinaryCodec`]: `application/octet-stream`, native structures `Vec<u8>` and [`Base64Payload`]
//! - [`TypedJsonCodec`]: `application/json` bound to a [`PayloadClass`]
//! - [`XmlCodec`]: `application/xml` bound to a [`PayloadClass`], native structure [`XmlNode`]
//!
//! ```
//! use std::sync::Arc;
//!
//! use esc_codec::{deserialize_as, serialize, JsonCodec, SimpleSerDeserializerRegistry};
//! use esc_id::SerializedDataType;
//! use serde_json::json;
//!
//! let book_added = SerializedDataType::new("BookAdded")?;
//! let registry = SimpleSerDeserializerRegistry::builder()
//!     .add_default(book_added.clone(), Arc::new(JsonCodec::new()))
//!     .build();
//!
//! let value = json!({"name": "Shining"});
//! let data = serialize(&registry, &book_added, Some(&value))?.expect("value is present");
//! assert_eq!(data.data(), br#"{"name":"Shining"}"#);
//!
//! let restored: serde_json::Value = deserialize_as(&registry, &data)?;
//! assert_eq!(restored, value);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod charset;
mod class;
pub mod codecs;
mod config;
mod contract;
mod data;
mod error;
mod mime;
pub mod registry;
mod util;
pub mod xml;

pub use charset::Charset;
pub use class::PayloadClass;
pub use codecs::{Base64Payload, BinaryCodec, JsonCodec, TextCodec, TypedJsonCodec, XmlAdapter, XmlCodec};
pub use config::{
    CodecKind, SerializationConfig, TypeBinding, CONFIG_PATH_ENV, ENCODING_ENV, XML_FRAGMENT_ENV,
};
pub use contract::{BoxedValue, Deserializer, Input, SerDeserializer, Serializer};
pub use data::SerializedData;
pub use error::{BoxError, CharsetError, ConfigError, MimeTypeError, SerializationError};
pub use mime::{MimeType, ENCODING_PARAM, VERSION_PARAM};
pub use registry::{
    DeserializerRegistry, DeserializerRegistryBuilder, SerDeserializerRegistryBuilder,
    SerializedDataTypeRegistry, SerializedDataTypeRegistryBuilder, SerializerRegistry,
    SerializerRegistryBuilder, SimpleDeserializerRegistry, SimpleSerDeserializerRegistry,
    SimpleSerializedDataTypeRegistry, SimpleSerializerRegistry,
};
pub use util::{common_mime_type, deserialize, deserialize_as, serialize};
pub use xml::XmlNode;
