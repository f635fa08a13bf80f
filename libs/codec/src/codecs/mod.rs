//! Concrete codecs.
//!
//! Every codec returns its input unchanged from `unmarshal` when that input is
//! already the codec's native in-memory structure; only raw bytes are parsed.

mod binary;
mod json;
mod text;
mod typed_json;
mod xml;

pub use binary::{Base64Payload, BinaryCodec};
pub use json::JsonCodec;
pub use text::TextCodec;
pub use typed_json::TypedJsonCodec;
pub use xml::{XmlAdapter, XmlCodec};

use crate::charset::Charset;
use crate::error::SerializationError;
use crate::mime::MimeType;

/// Charset named by `mime_type`, or `fallback` if it names none.
fn charset_of(mime_type: &MimeType, fallback: Charset) -> Result<Charset, SerializationError> {
    Ok(mime_type.charset()?.unwrap_or(fallback))
}
