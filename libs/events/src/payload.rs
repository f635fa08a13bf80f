//! Payloads in their format-level, in-memory form.

use std::any::Any;
use std::fmt;

use esc_codec::xml::{XmlContent, XmlNode};
use esc_codec::{BoxedValue, Charset, MimeType};
use serde_json::{Map, Value};

use crate::error::EnvelopeError;

pub use esc_codec::Base64Payload;

/// Key of a binary payload in JSON, and element name of one in XML.
pub const BASE64_TAG: &str = "Base64";

/// An event or metadata payload.
///
/// The variant is fixed by the content type the payload is carried as; see
/// [`PayloadKind::for_content_type`].
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A JSON tree.
    Json(Value),
    /// An XML element.
    Xml(XmlNode),
    /// Plain text.
    Text(String),
    /// Opaque bytes.
    Binary(Base64Payload),
}

/// The variant of a [`Payload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    Json,
    Xml,
    Text,
    Binary,
}

impl PayloadKind {
    /// JSON and XML types map to their tree kinds, other `text/*` types to text,
    /// anything else to binary.
    pub fn for_content_type(content_type: &MimeType) -> Self {
        if content_type.is_json() {
            PayloadKind::Json
        } else if content_type.is_xml() {
            PayloadKind::Xml
        } else if content_type.is_text() {
            PayloadKind::Text
        } else {
            PayloadKind::Binary
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadKind::Json => write!(f, "JSON"),
            PayloadKind::Xml => write!(f, "XML"),
            PayloadKind::Text => write!(f, "text"),
            PayloadKind::Binary => write!(f, "binary"),
        }
    }
}

impl Payload {
    pub fn binary(bytes: impl Into<Vec<u8>>) -> Self {
        Payload::Binary(Base64Payload::from_bytes(bytes))
    }

    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::Json(_) => PayloadKind::Json,
            Payload::Xml(_) => PayloadKind::Xml,
            Payload::Text(_) => PayloadKind::Text,
            Payload::Binary(_) => PayloadKind::Binary,
        }
    }

    /// Fails unless the payload can be carried as `content_type`.
    pub fn check_content_type(&self, content_type: &MimeType) -> Result<(), EnvelopeError> {
        if PayloadKind::for_content_type(content_type) == self.kind() {
            Ok(())
        } else {
            Err(EnvelopeError::PayloadMismatch {
                kind: self.kind(),
                content_type: content_type.clone(),
            })
        }
    }

    /// The inner value, as handed to a serializer.
    pub fn as_any(&self) -> &dyn Any {
        match self {
            Payload::Json(value) => value,
            Payload::Xml(node) => node,
            Payload::Text(text) => text,
            Payload::Binary(payload) => payload,
        }
    }

    /// Wraps a deserializer's output if it is one of the format-level structures.
    ///
    /// Anything else, such as an instance of a bound class, is handed back.
    pub fn from_native(value: BoxedValue) -> Result<Self, BoxedValue> {
        let value = match value.downcast::<Value>() {
            Ok(json) => return Ok(Payload::Json(*json)),
            Err(value) => value,
        };
        let value = match value.downcast::<XmlNode>() {
            Ok(node) => return Ok(Payload::Xml(*node)),
            Err(value) => value,
        };
        let value = match value.downcast::<String>() {
            Ok(text) => return Ok(Payload::Text(*text)),
            Err(value) => value,
        };
        let value = match value.downcast::<Base64Payload>() {
            Ok(payload) => return Ok(Payload::Binary(*payload)),
            Err(value) => value,
        };
        match value.downcast::<Vec<u8>>() {
            Ok(bytes) => Ok(Payload::binary(*bytes)),
            Err(value) => Err(value),
        }
    }

    /// Parses wire bytes according to `content_type`.
    pub fn from_bytes(bytes: &[u8], content_type: &MimeType) -> Result<Self, EnvelopeError> {
        let kind = PayloadKind::for_content_type(content_type);
        if kind == PayloadKind::Binary {
            return Ok(Payload::binary(bytes));
        }

        let text = charset(content_type)?.decode(bytes)?;
        Ok(match kind {
            PayloadKind::Json => Payload::Json(serde_json::from_str(&text)?),
            PayloadKind::Xml => Payload::Xml(XmlNode::parse(&text)?),
            _ => Payload::Text(text),
        })
    }

    /// Writes the payload as wire bytes for `content_type`.
    pub fn to_bytes(&self, content_type: &MimeType) -> Result<Vec<u8>, EnvelopeError> {
        self.check_content_type(content_type)?;
        let text = match self {
            Payload::Binary(payload) => return Ok(payload.bytes()?.to_vec()),
            Payload::Json(value) => serde_json::to_string(value)?,
            Payload::Xml(node) => node.to_xml_string()?,
            Payload::Text(text) => text.clone(),
        };
        Ok(charset(content_type)?.encode(&text)?)
    }
}

fn charset(content_type: &MimeType) -> Result<Charset, EnvelopeError> {
    Ok(content_type.charset()?.unwrap_or_default())
}

/// An event's data payload as carried inside an envelope.
///
/// In JSON, a JSON payload is embedded as-is, text and XML payloads as strings
/// and binary payloads as `{"Base64": "..."}`. In XML, an XML payload is
/// embedded as an element, JSON and text payloads as CDATA and binary payloads
/// as a `<Base64>` element.
#[derive(Debug, Clone, PartialEq)]
pub struct DataWrapper(Payload);

impl DataWrapper {
    pub fn new(payload: Payload) -> Self {
        Self(payload)
    }

    pub fn payload(&self) -> &Payload {
        &self.0
    }

    pub fn into_payload(self) -> Payload {
        self.0
    }

    pub fn kind(&self) -> PayloadKind {
        self.0.kind()
    }

    pub fn to_json(&self) -> Result<Value, EnvelopeError> {
        payload_to_json(&self.0)
    }

    /// Reads a payload embedded by [`to_json`](Self::to_json).
    pub fn from_json(value: &Value, content_type: &MimeType) -> Result<Self, EnvelopeError> {
        payload_from_json(value, content_type, "Data").map(Self)
    }

    /// Appends the embedded payload to `parent`.
    pub fn write_xml(&self, parent: &mut XmlNode) -> Result<(), EnvelopeError> {
        payload_to_xml(&self.0, parent)
    }

    /// Reads a payload embedded in `parent` by [`write_xml`](Self::write_xml).
    pub fn from_xml(parent: &XmlNode, content_type: &MimeType) -> Result<Self, EnvelopeError> {
        payload_from_xml(parent, content_type, "Data").map(Self)
    }
}

impl From<Payload> for DataWrapper {
    fn from(payload: Payload) -> Self {
        Self(payload)
    }
}

pub(crate) fn payload_to_json(payload: &Payload) -> Result<Value, EnvelopeError> {
    Ok(match payload {
        Payload::Json(value) => value.clone(),
        Payload::Text(text) => Value::String(text.clone()),
        Payload::Xml(node) => Value::String(node.to_xml_string()?),
        Payload::Binary(payload) => {
            let mut object = Map::new();
            object.insert(
                BASE64_TAG.to_string(),
                Value::String(payload.as_base64().to_string()),
            );
            Value::Object(object)
        }
    })
}

pub(crate) fn payload_from_json(
    value: &Value,
    content_type: &MimeType,
    field: &'static str,
) -> Result<Payload, EnvelopeError> {
    match PayloadKind::for_content_type(content_type) {
        PayloadKind::Json => Ok(Payload::Json(value.clone())),
        PayloadKind::Text => Ok(Payload::Text(expect_str(value, field)?.to_string())),
        PayloadKind::Xml => Ok(Payload::Xml(XmlNode::parse(expect_str(value, field)?)?)),
        PayloadKind::Binary => {
            let encoded = value
                .get(BASE64_TAG)
                .ok_or(EnvelopeError::MissingField(BASE64_TAG))?;
            Ok(Payload::Binary(decode_base64(expect_str(encoded, BASE64_TAG)?)?))
        }
    }
}

pub(crate) fn payload_to_xml(payload: &Payload, parent: &mut XmlNode) -> Result<(), EnvelopeError> {
    let content = match payload {
        Payload::Json(value) => XmlContent::CData(serde_json::to_string(value)?),
        Payload::Text(text) => XmlContent::CData(text.clone()),
        Payload::Xml(node) => XmlContent::Element(node.clone()),
        Payload::Binary(payload) => {
            XmlContent::Element(XmlNode::new(BASE64_TAG).with_text(payload.as_base64()))
        }
    };
    parent.push(content);
    Ok(())
}

pub(crate) fn payload_from_xml(
    parent: &XmlNode,
    content_type: &MimeType,
    field: &'static str,
) -> Result<Payload, EnvelopeError> {
    match PayloadKind::for_content_type(content_type) {
        PayloadKind::Json => Ok(Payload::Json(serde_json::from_str(&parent.text())?)),
        PayloadKind::Text => Ok(Payload::Text(parent.text())),
        PayloadKind::Xml => parent
            .elements()
            .next()
            .cloned()
            .map(Payload::Xml)
            .ok_or_else(|| EnvelopeError::invalid(field, "expected an XML element")),
        PayloadKind::Binary => {
            let encoded = parent
                .child(BASE64_TAG)
                .ok_or(EnvelopeError::MissingField(BASE64_TAG))?;
            Ok(Payload::Binary(decode_base64(&encoded.text())?))
        }
    }
}

pub(crate) fn expect_str<'a>(value: &'a Value, field: &'static str) -> Result<&'a str, EnvelopeError> {
    value
        .as_str()
        .ok_or_else(|| EnvelopeError::invalid(field, "expected a string"))
}

/// Validates base64 text up front so a bad envelope fails where it is read.
pub(crate) fn decode_base64(encoded: &str) -> Result<Base64Payload, EnvelopeError> {
    let payload = Base64Payload::from_base64(encoded);
    payload.bytes()?;
    Ok(payload)
}
