//! Type bookkeeping carried next to an event's data.
//!
//! JSON form, keys in this order:
//!
//! ```text
//! {"data-type": "...", "data-content-type": "...",
//!  "meta-type": "...", "meta-content-type": "...", "<meta-type or Base64>": <payload>}
//! ```
//!
//! The last three keys are present only when the event has metadata.

use esc_codec::xml::XmlNode;
use esc_codec::MimeType;
use esc_id::SerializedDataType;
use serde_json::{Map, Value};

use crate::error::EnvelopeError;
use crate::payload::{
    decode_base64, expect_str, payload_from_json, payload_from_xml, payload_to_json,
    payload_to_xml, Payload, PayloadKind, BASE64_TAG,
};

pub const DATA_TYPE: &str = "data-type";
pub const DATA_CONTENT_TYPE: &str = "data-content-type";
pub const META_TYPE: &str = "meta-type";
pub const META_CONTENT_TYPE: &str = "meta-content-type";
/// XML element holding the metadata payload.
pub const META_DATA: &str = "meta-data";

/// Keys a metadata payload cannot be stored under.
const RESERVED_KEYS: [&str; 4] = [DATA_TYPE, DATA_CONTENT_TYPE, META_TYPE, META_CONTENT_TYPE];

/// The types and content types of an event's data and metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SystemMeta {
    data_type: SerializedDataType,
    data_content_type: MimeType,
    meta: Option<(SerializedDataType, MimeType)>,
}

impl SystemMeta {
    /// Bookkeeping for an event without metadata.
    pub fn new(data_type: SerializedDataType, data_content_type: MimeType) -> Self {
        Self {
            data_type,
            data_content_type,
            meta: None,
        }
    }

    /// Bookkeeping for an event with metadata.
    pub fn with_meta(
        data_type: SerializedDataType,
        data_content_type: MimeType,
        meta_type: SerializedDataType,
        meta_content_type: MimeType,
    ) -> Self {
        Self {
            data_type,
            data_content_type,
            meta: Some((meta_type, meta_content_type)),
        }
    }

    pub fn data_type(&self) -> &SerializedDataType {
        &self.data_type
    }

    pub fn data_content_type(&self) -> &MimeType {
        &self.data_content_type
    }

    pub fn meta_type(&self) -> Option<&SerializedDataType> {
        self.meta.as_ref().map(|(meta_type, _)| meta_type)
    }

    pub fn meta_content_type(&self) -> Option<&MimeType> {
        self.meta.as_ref().map(|(_, content_type)| content_type)
    }

    pub fn has_meta(&self) -> bool {
        self.meta.is_some()
    }

    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        object.insert(DATA_TYPE.to_string(), Value::from(self.data_type.as_str()));
        object.insert(
            DATA_CONTENT_TYPE.to_string(),
            Value::from(self.data_content_type.to_string()),
        );
        if let Some((meta_type, meta_content_type)) = &self.meta {
            object.insert(META_TYPE.to_string(), Value::from(meta_type.as_str()));
            object.insert(
                META_CONTENT_TYPE.to_string(),
                Value::from(meta_content_type.to_string()),
            );
        }
        Value::Object(object)
    }

    /// Reads the object written by [`to_json`](Self::to_json); other keys are ignored.
    pub fn from_json(value: &Value) -> Result<Self, EnvelopeError> {
        let object = value
            .as_object()
            .ok_or_else(|| EnvelopeError::invalid("MetaData", "expected an object"))?;
        let data_type = SerializedDataType::new(required_str(object, DATA_TYPE)?)?;
        let data_content_type = MimeType::parse(required_str(object, DATA_CONTENT_TYPE)?)?;

        let meta = match object.get(META_TYPE) {
            None => None,
            Some(meta_type) => {
                let meta_type = SerializedDataType::new(expect_str(meta_type, META_TYPE)?)?;
                let content_type = MimeType::parse(required_str(object, META_CONTENT_TYPE)?)?;
                Some((meta_type, content_type))
            }
        };

        Ok(Self {
            data_type,
            data_content_type,
            meta,
        })
    }
}

/// User metadata: its type, content type and payload.
#[derive(Debug, Clone, PartialEq)]
pub struct UserMeta {
    meta_type: SerializedDataType,
    content_type: MimeType,
    payload: Payload,
}

impl UserMeta {
    /// Fails if the payload variant does not match `content_type`, or if the
    /// metadata type would collide with another key of the JSON envelope.
    ///
    /// `Base64` is only accepted as the type of binary metadata.
    pub fn new(
        meta_type: SerializedDataType,
        content_type: MimeType,
        payload: Payload,
    ) -> Result<Self, EnvelopeError> {
        payload.check_content_type(&content_type)?;
        if RESERVED_KEYS.contains(&meta_type.as_str()) {
            return Err(EnvelopeError::invalid(
                META_TYPE,
                format!("'{meta_type}' is a reserved envelope key"),
            ));
        }
        if meta_type.as_str() == BASE64_TAG && payload.kind() != PayloadKind::Binary {
            return Err(EnvelopeError::invalid(
                META_TYPE,
                format!("'{BASE64_TAG}' names binary metadata only"),
            ));
        }
        Ok(Self {
            meta_type,
            content_type,
            payload,
        })
    }

    pub fn meta_type(&self) -> &SerializedDataType {
        &self.meta_type
    }

    pub fn content_type(&self) -> &MimeType {
        &self.content_type
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn into_payload(self) -> Payload {
        self.payload
    }

    /// The JSON key the payload is stored under.
    fn json_key(&self) -> &str {
        match self.payload {
            Payload::Binary(_) => BASE64_TAG,
            _ => self.meta_type.as_str(),
        }
    }
}

/// [`SystemMeta`] plus the user metadata payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Meta {
    data_type: SerializedDataType,
    data_content_type: MimeType,
    user: Option<UserMeta>,
}

impl Meta {
    pub fn new(
        data_type: SerializedDataType,
        data_content_type: MimeType,
        user: Option<UserMeta>,
    ) -> Self {
        Self {
            data_type,
            data_content_type,
            user,
        }
    }

    pub fn data_type(&self) -> &SerializedDataType {
        &self.data_type
    }

    pub fn data_content_type(&self) -> &MimeType {
        &self.data_content_type
    }

    pub fn user(&self) -> Option<&UserMeta> {
        self.user.as_ref()
    }

    pub fn into_user(self) -> Option<UserMeta> {
        self.user
    }

    pub fn system_meta(&self) -> SystemMeta {
        match &self.user {
            Some(user) => SystemMeta::with_meta(
                self.data_type.clone(),
                self.data_content_type.clone(),
                user.meta_type.clone(),
                user.content_type.clone(),
            ),
            None => SystemMeta::new(self.data_type.clone(), self.data_content_type.clone()),
        }
    }

    pub fn to_json(&self) -> Result<Value, EnvelopeError> {
        let mut value = self.system_meta().to_json();
        if let (Some(user), Value::Object(object)) = (&self.user, &mut value) {
            let payload = match &user.payload {
                Payload::Binary(payload) => Value::from(payload.as_base64()),
                other => payload_to_json(other)?,
            };
            object.insert(user.json_key().to_string(), payload);
        }
        Ok(value)
    }

    /// Reads the object written by [`to_json`](Self::to_json).
    ///
    /// Binary metadata is read under `Base64`, anything else under the metadata
    /// type's key. Unrelated keys are ignored.
    pub fn from_json(value: &Value) -> Result<Self, EnvelopeError> {
        let system = SystemMeta::from_json(value)?;
        let (data_type, data_content_type, meta) =
            (system.data_type, system.data_content_type, system.meta);
        let Some((meta_type, content_type)) = meta else {
            return Ok(Self::new(data_type, data_content_type, None));
        };

        let payload = if PayloadKind::for_content_type(&content_type) == PayloadKind::Binary {
            let encoded = value
                .get(BASE64_TAG)
                .ok_or(EnvelopeError::MissingField(BASE64_TAG))?;
            Payload::Binary(decode_base64(expect_str(encoded, BASE64_TAG)?)?)
        } else {
            let raw = value
                .get(meta_type.as_str())
                .ok_or_else(|| EnvelopeError::invalid(META_TYPE, format!("no payload under '{meta_type}'")))?;
            payload_from_json(raw, &content_type, META_TYPE)?
        };

        let user = UserMeta::new(meta_type, content_type, payload)?;
        Ok(Self::new(data_type, data_content_type, Some(user)))
    }

    /// Writes the `MetaData` element.
    pub fn to_xml(&self) -> Result<XmlNode, EnvelopeError> {
        let mut node = XmlNode::new("MetaData")
            .with_child(XmlNode::new(DATA_TYPE).with_text(self.data_type.as_str()))
            .with_child(
                XmlNode::new(DATA_CONTENT_TYPE).with_text(self.data_content_type.to_string()),
            );
        if let Some(user) = &self.user {
            let mut payload = XmlNode::new(META_DATA);
            payload_to_xml(&user.payload, &mut payload)?;
            node = node
                .with_child(XmlNode::new(META_TYPE).with_text(user.meta_type.as_str()))
                .with_child(XmlNode::new(META_CONTENT_TYPE).with_text(user.content_type.to_string()))
                .with_child(payload);
        }
        Ok(node)
    }

    /// Reads the element written by [`to_xml`](Self::to_xml).
    pub fn from_xml(node: &XmlNode) -> Result<Self, EnvelopeError> {
        let data_type = SerializedDataType::new(required_text(node, DATA_TYPE)?)?;
        let data_content_type = MimeType::parse(&required_text(node, DATA_CONTENT_TYPE)?)?;

        let user = match node.child(META_TYPE) {
            None => None,
            Some(meta_type) => {
                let meta_type = SerializedDataType::new(meta_type.text())?;
                let content_type = MimeType::parse(&required_text(node, META_CONTENT_TYPE)?)?;
                let container = node
                    .child(META_DATA)
                    .ok_or(EnvelopeError::MissingField(META_DATA))?;
                let payload = payload_from_xml(container, &content_type, META_DATA)?;
                Some(UserMeta::new(meta_type, content_type, payload)?)
            }
        };

        Ok(Self::new(data_type, data_content_type, user))
    }

    /// Fails unless the data payload kind matches the data content type.
    pub(crate) fn check_data(&self, kind: PayloadKind) -> Result<(), EnvelopeError> {
        if PayloadKind::for_content_type(&self.data_content_type) == kind {
            Ok(())
        } else {
            Err(EnvelopeError::PayloadMismatch {
                kind,
                content_type: self.data_content_type.clone(),
            })
        }
    }
}

fn required_str<'a>(object: &'a Map<String, Value>, key: &'static str) -> Result<&'a str, EnvelopeError> {
    let value = object.get(key).ok_or(EnvelopeError::MissingField(key))?;
    expect_str(value, key)
}

fn required_text(node: &XmlNode, name: &'static str) -> Result<String, EnvelopeError> {
    node.child(name)
        .map(XmlNode::text)
        .ok_or(EnvelopeError::MissingField(name))
}
