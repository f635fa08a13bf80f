//! # esc-events
//!
//! Event payloads and the self-describing envelopes they travel in.
//!
//! ## Design Principles
//!
//! - A payload is exactly one of JSON, XML, text or binary, fixed by its content type
//! - Envelopes record data and metadata types, so readers need no external schema
//! - Encoding and decoding are exact inverses, in JSON and in XML
//! - Event identity is the event id alone
//!
//! ## Layers
//!
//! - [`CommonEvent`]: the domain event with its [`Payload`]s
//! - [`SerializedEvent`]: data and metadata as `(type, mime type, bytes)` triples
//! - [`Event`] / [`Events`]: the envelope, with [`Meta`] and [`DataWrapper`]
//!
//! ```
//! use esc_codec::{Charset, MimeType};
//! use esc_events::{DataWrapper, Event, Meta, Payload};
//! use esc_id::{EventId, EventType, SerializedDataType};
//!
//! let event = Event::new(
//!     EventId::new(),
//!     EventType::new("BookAdded")?,
//!     DataWrapper::new(Payload::Text("Shining".to_string())),
//!     Meta::new(SerializedDataType::new("BookAdded")?, MimeType::text(Charset::Utf8), None),
//! )?;
//! let json = event.to_json_string()?;
//! assert_eq!(Event::from_json_str(&json)?, event);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod batch;
mod error;
mod event;
mod meta;
mod payload;
mod store;

pub use batch::{common_mime_type, serialize_all, to_envelopes};
pub use error::EnvelopeError;
pub use event::{CommonEvent, Event, Events, SerializedEvent, TypedPayload};
pub use meta::{
    Meta, SystemMeta, UserMeta, DATA_CONTENT_TYPE, DATA_TYPE, META_CONTENT_TYPE, META_DATA,
    META_TYPE,
};
pub use payload::{Base64Payload, DataWrapper, Payload, PayloadKind, BASE64_TAG};
pub use store::{ExpectedVersion, ReadRange, ReadableEventStore, WritableEventStore};
