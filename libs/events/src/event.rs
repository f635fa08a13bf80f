//! Domain events, their serialized form and their envelopes.

use std::any::Any;
use std::hash::{Hash, Hasher};

use esc_codec::xml::XmlNode;
use esc_codec::{
    deserialize, serialize, BoxedValue, DeserializerRegistry, Input, MimeType, SerializedData,
    SerializerRegistry,
};
use esc_id::{EventId, EventType, SerializedDataType};
use serde_json::{Map, Value};
use tracing::trace;

use crate::error::EnvelopeError;
use crate::meta::{Meta, UserMeta};
use crate::payload::{expect_str, DataWrapper, Payload};

const EVENT: &str = "Event";
const EVENTS: &str = "Events";
const EVENT_ID: &str = "EventId";
const EVENT_TYPE: &str = "EventType";
const DATA: &str = "Data";
const META_DATA: &str = "MetaData";

/// A payload tagged with its logical type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedPayload {
    pub data_type: SerializedDataType,
    pub payload: Payload,
}

impl TypedPayload {
    pub fn new(data_type: SerializedDataType, payload: Payload) -> Self {
        Self { data_type, payload }
    }
}

/// A domain event before wire encoding.
///
/// Identity, equality and hashing are defined on the id alone.
#[derive(Debug, Clone)]
pub struct CommonEvent {
    id: EventId,
    event_type: EventType,
    data: Payload,
    meta: Option<TypedPayload>,
}

impl CommonEvent {
    pub fn new(id: EventId, event_type: EventType, data: Payload) -> Self {
        Self {
            id,
            event_type,
            data,
            meta: None,
        }
    }

    #[must_use]
    pub fn with_meta(mut self, meta: TypedPayload) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    pub fn data(&self) -> &Payload {
        &self.data
    }

    pub fn meta(&self) -> Option<&TypedPayload> {
        self.meta.as_ref()
    }

    /// Logical type of the data, which is the event type.
    pub fn data_type(&self) -> SerializedDataType {
        SerializedDataType::from(&self.event_type)
    }

    /// Serializes data and metadata through `registry`.
    pub fn serialize<R>(&self, registry: &R) -> Result<SerializedEvent, EnvelopeError>
    where
        R: SerializerRegistry + ?Sized,
    {
        let meta = self
            .meta
            .as_ref()
            .map(|meta| (&meta.data_type, meta.payload.as_any()));
        SerializedEvent::from_values(
            registry,
            self.id,
            self.event_type.clone(),
            self.data.as_any(),
            meta,
        )
    }
}

impl PartialEq for CommonEvent {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CommonEvent {}

impl Hash for CommonEvent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// An event whose data and metadata went through serializers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedEvent {
    id: EventId,
    event_type: EventType,
    data: SerializedData,
    meta: Option<SerializedData>,
}

impl SerializedEvent {
    pub fn new(
        id: EventId,
        event_type: EventType,
        data: SerializedData,
        meta: Option<SerializedData>,
    ) -> Self {
        Self {
            id,
            event_type,
            data,
            meta,
        }
    }

    /// Serializes domain values: the data under the event type, the metadata
    /// under its own type.
    pub fn from_values<R>(
        registry: &R,
        id: EventId,
        event_type: EventType,
        data: &dyn Any,
        meta: Option<(&SerializedDataType, &dyn Any)>,
    ) -> Result<Self, EnvelopeError>
    where
        R: SerializerRegistry + ?Sized,
    {
        let data_type = SerializedDataType::from(&event_type);
        let data = serialize(registry, &data_type, Some(data))?
            .ok_or(EnvelopeError::MissingField(DATA))?;
        let meta = match meta {
            Some((meta_type, value)) => serialize(registry, meta_type, Some(value))?,
            None => None,
        };
        trace!(event_id = %id, %event_type, has_meta = meta.is_some(), "serialized event");
        Ok(Self::new(id, event_type, data, meta))
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    pub fn data(&self) -> &SerializedData {
        &self.data
    }

    pub fn meta(&self) -> Option<&SerializedData> {
        self.meta.as_ref()
    }

    /// Deserializes the data into a domain value.
    pub fn deserialize_data<R>(&self, registry: &R) -> Result<BoxedValue, EnvelopeError>
    where
        R: DeserializerRegistry + ?Sized,
    {
        Ok(deserialize(registry, &self.data)?)
    }

    /// Deserializes the metadata into a domain value, if there is any.
    pub fn deserialize_meta<R>(&self, registry: &R) -> Result<Option<BoxedValue>, EnvelopeError>
    where
        R: DeserializerRegistry + ?Sized,
    {
        self.meta
            .as_ref()
            .map(|meta| deserialize(registry, meta).map_err(EnvelopeError::from))
            .transpose()
    }

    /// Rebuilds the domain event through `registry`.
    ///
    /// Codecs producing a format-level structure yield it directly; for class-bound
    /// codecs the payload is read from the bytes.
    pub fn deserialize<R>(&self, registry: &R) -> Result<CommonEvent, EnvelopeError>
    where
        R: DeserializerRegistry + ?Sized,
    {
        let data = to_payload(registry, &self.data)?;
        let mut event = CommonEvent::new(self.id, self.event_type.clone(), data);
        if let Some(meta) = &self.meta {
            event = event.with_meta(TypedPayload::new(
                meta.data_type().clone(),
                to_payload(registry, meta)?,
            ));
        }
        Ok(event)
    }
}

fn to_payload<R>(registry: &R, data: &SerializedData) -> Result<Payload, EnvelopeError>
where
    R: DeserializerRegistry + ?Sized,
{
    let deserializer = registry.get_deserializer(data.data_type(), Some(data.mime_type()))?;
    let value = deserializer.unmarshal(Input::Bytes(data.data()), data.data_type(), data.mime_type())?;
    match Payload::from_native(value) {
        Ok(payload) => Ok(payload),
        Err(_) => Payload::from_bytes(data.data(), data.mime_type()),
    }
}

/// The self-describing envelope of one event.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    id: EventId,
    event_type: EventType,
    data: DataWrapper,
    meta: Meta,
}

impl Event {
    /// Fails if the data payload does not match the data content type.
    pub fn new(
        id: EventId,
        event_type: EventType,
        data: DataWrapper,
        meta: Meta,
    ) -> Result<Self, EnvelopeError> {
        meta.check_data(data.kind())?;
        Ok(Self {
            id,
            event_type,
            data,
            meta,
        })
    }

    /// Wraps a domain event, taking content types from the serializers in `registry`.
    pub fn from_common<R>(event: &CommonEvent, registry: &R) -> Result<Self, EnvelopeError>
    where
        R: SerializerRegistry + ?Sized,
    {
        let data_type = event.data_type();
        let data_content_type = registry.get_serializer(&data_type)?.mime_type().clone();
        let user = match event.meta() {
            Some(meta) => {
                let content_type = registry.get_serializer(&meta.data_type)?.mime_type().clone();
                Some(UserMeta::new(
                    meta.data_type.clone(),
                    content_type,
                    meta.payload.clone(),
                )?)
            }
            None => None,
        };
        Self::new(
            event.id(),
            event.event_type().clone(),
            DataWrapper::new(event.data().clone()),
            Meta::new(data_type, data_content_type, user),
        )
    }

    /// Wraps a serialized event, parsing its bytes by content type.
    pub fn from_serialized(event: &SerializedEvent) -> Result<Self, EnvelopeError> {
        let data = Payload::from_bytes(event.data.data(), event.data.mime_type())?;
        let user = match &event.meta {
            Some(meta) => Some(UserMeta::new(
                meta.data_type().clone(),
                meta.mime_type().clone(),
                Payload::from_bytes(meta.data(), meta.mime_type())?,
            )?),
            None => None,
        };
        Self::new(
            event.id,
            event.event_type.clone(),
            DataWrapper::new(data),
            Meta::new(
                event.data.data_type().clone(),
                event.data.mime_type().clone(),
                user,
            ),
        )
    }

    /// Writes the payloads back to bytes under their content types.
    pub fn to_serialized(&self) -> Result<SerializedEvent, EnvelopeError> {
        let content_type = self.meta.data_content_type();
        let data = SerializedData::new(
            self.meta.data_type().clone(),
            content_type.clone(),
            self.data.payload().to_bytes(content_type)?,
        );
        let meta = match self.meta.user() {
            Some(user) => Some(SerializedData::new(
                user.meta_type().clone(),
                user.content_type().clone(),
                user.payload().to_bytes(user.content_type())?,
            )),
            None => None,
        };
        Ok(SerializedEvent::new(self.id, self.event_type.clone(), data, meta))
    }

    /// Unwraps into the domain event.
    pub fn into_common(self) -> CommonEvent {
        let event = CommonEvent::new(self.id, self.event_type, self.data.into_payload());
        match self.meta.into_user() {
            Some(user) => {
                let meta_type = user.meta_type().clone();
                event.with_meta(TypedPayload::new(meta_type, user.into_payload()))
            }
            None => event,
        }
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    pub fn data(&self) -> &DataWrapper {
        &self.data
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    pub fn data_content_type(&self) -> &MimeType {
        self.meta.data_content_type()
    }

    pub fn to_json(&self) -> Result<Value, EnvelopeError> {
        let mut object = Map::new();
        object.insert(EVENT_ID.to_string(), Value::from(self.id.to_string()));
        object.insert(EVENT_TYPE.to_string(), Value::from(self.event_type.as_str()));
        object.insert(DATA.to_string(), self.data.to_json()?);
        object.insert(META_DATA.to_string(), self.meta.to_json()?);
        Ok(Value::Object(object))
    }

    pub fn to_json_string(&self) -> Result<String, EnvelopeError> {
        Ok(serde_json::to_string(&self.to_json()?)?)
    }

    /// Reads the object written by [`to_json`](Self::to_json).
    pub fn from_json(value: &Value) -> Result<Self, EnvelopeError> {
        let field = |name: &'static str| value.get(name).ok_or(EnvelopeError::MissingField(name));

        let id = EventId::parse(expect_str(field(EVENT_ID)?, EVENT_ID)?)?;
        let event_type = EventType::new(expect_str(field(EVENT_TYPE)?, EVENT_TYPE)?)?;
        let meta = Meta::from_json(field(META_DATA)?)?;
        let data = DataWrapper::from_json(field(DATA)?, meta.data_content_type())?;
        Self::new(id, event_type, data, meta)
    }

    pub fn from_json_str(json: &str) -> Result<Self, EnvelopeError> {
        Self::from_json(&serde_json::from_str(json)?)
    }

    /// Writes the `Event` element.
    pub fn to_xml(&self) -> Result<XmlNode, EnvelopeError> {
        let mut data = XmlNode::new(DATA);
        self.data.write_xml(&mut data)?;
        Ok(XmlNode::new(EVENT)
            .with_child(XmlNode::new(EVENT_ID).with_text(self.id.to_string()))
            .with_child(XmlNode::new(EVENT_TYPE).with_text(self.event_type.as_str()))
            .with_child(data)
            .with_child(self.meta.to_xml()?))
    }

    pub fn to_xml_string(&self) -> Result<String, EnvelopeError> {
        Ok(self.to_xml()?.to_xml_string()?)
    }

    /// Reads the element written by [`to_xml`](Self::to_xml).
    pub fn from_xml(node: &XmlNode) -> Result<Self, EnvelopeError> {
        expect_element(node, EVENT)?;
        let child = |name: &'static str| node.child(name).ok_or(EnvelopeError::MissingField(name));

        let id = EventId::parse(&child(EVENT_ID)?.text())?;
        let event_type = EventType::new(child(EVENT_TYPE)?.text())?;
        let meta = Meta::from_xml(child(META_DATA)?)?;
        let data = DataWrapper::from_xml(child(DATA)?, meta.data_content_type())?;
        Self::new(id, event_type, data, meta)
    }

    pub fn from_xml_str(xml: &str) -> Result<Self, EnvelopeError> {
        Self::from_xml(&XmlNode::parse(xml)?)
    }
}

/// An ordered batch of envelopes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Events(Vec<Event>);

impl Events {
    pub fn new(events: Vec<Event>) -> Self {
        Self(events)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.0.iter()
    }

    pub fn push(&mut self, event: Event) {
        self.0.push(event);
    }

    pub fn into_inner(self) -> Vec<Event> {
        self.0
    }

    /// The data content type shared by every event, if there is one.
    pub fn common_content_type(&self) -> Option<&MimeType> {
        let (first, rest) = self.0.split_first()?;
        let content_type = first.data_content_type();
        rest.iter()
            .all(|event| event.data_content_type() == content_type)
            .then_some(content_type)
    }

    pub fn to_json(&self) -> Result<Value, EnvelopeError> {
        self.0
            .iter()
            .map(Event::to_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }

    pub fn from_json(value: &Value) -> Result<Self, EnvelopeError> {
        let events = value
            .as_array()
            .ok_or_else(|| EnvelopeError::invalid("Events", "expected an array"))?;
        events.iter().map(Event::from_json).collect::<Result<_, _>>().map(Self)
    }

    pub fn to_xml(&self) -> Result<XmlNode, EnvelopeError> {
        self.0.iter().try_fold(XmlNode::new(EVENTS), |node, event| {
            Ok(node.with_child(event.to_xml()?))
        })
    }

    pub fn from_xml(node: &XmlNode) -> Result<Self, EnvelopeError> {
        expect_element(node, EVENTS)?;
        node.elements().map(Event::from_xml).collect::<Result<_, _>>().map(Self)
    }
}

fn expect_element(node: &XmlNode, name: &'static str) -> Result<(), EnvelopeError> {
    if node.name() == name {
        Ok(())
    } else {
        Err(EnvelopeError::invalid(name, format!("unexpected element <{}>", node.name())))
    }
}

impl From<Vec<Event>> for Events {
    fn from(events: Vec<Event>) -> Self {
        Self(events)
    }
}

impl IntoIterator for Events {
    type Item = Event;
    type IntoIter = std::vec::IntoIter<Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Events {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use esc_codec::Charset;
    use serde_json::json;

    use super::*;

    fn book_added() -> EventType {
        EventType::new("BookAdded").unwrap()
    }

    fn json_event() -> Event {
        let meta = Meta::new(
            SerializedDataType::new("BookAdded").unwrap(),
            MimeType::json(Charset::Utf8),
            None,
        );
        Event::new(
            EventId::new(),
            book_added(),
            DataWrapper::new(Payload::Json(json!({"name": "Shining"}))),
            meta,
        )
        .unwrap()
    }

    #[test]
    fn test_common_event_identity() {
        let id = EventId::new();
        let a = CommonEvent::new(id, book_added(), Payload::Text("a".to_string()));
        let b = CommonEvent::new(id, book_added(), Payload::Text("b".to_string()));
        let c = CommonEvent::new(EventId::new(), book_added(), Payload::Text("a".to_string()));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_event_rejects_mismatched_data() {
        let meta = Meta::new(
            SerializedDataType::new("BookAdded").unwrap(),
            MimeType::json(Charset::Utf8),
            None,
        );
        let err = Event::new(
            EventId::new(),
            book_added(),
            DataWrapper::new(Payload::Text("x".to_string())),
            meta,
        )
        .unwrap_err();
        assert!(matches!(err, EnvelopeError::PayloadMismatch { .. }));
    }

    #[test]
    fn test_json_shape() {
        let event = json_event();
        let value = event.to_json().unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["EventId", "EventType", "Data", "MetaData"]);
        assert_eq!(value["Data"], json!({"name": "Shining"}));
        assert_eq!(Event::from_json(&value).unwrap(), event);
    }

    #[test]
    fn test_xml_roundtrip() {
        let event = json_event();
        let xml = event.to_xml_string().unwrap();
        assert!(xml.starts_with("<Event><EventId>"));
        assert!(xml.contains(r#"<Data><![CDATA[{"name":"Shining"}]]></Data>"#));
        assert_eq!(Event::from_xml_str(&xml).unwrap(), event);
    }

    #[test]
    fn test_xml_element_names_checked() {
        let xml = json_event().to_xml_string().unwrap();
        let renamed = xml.replacen("<Event>", "<Command>", 1).replacen("</Event>", "</Command>", 1);
        assert!(matches!(
            Event::from_xml_str(&renamed),
            Err(EnvelopeError::InvalidField { field: "Event", .. })
        ));

        let batch = XmlNode::new("Events").with_child(XmlNode::parse(&renamed).unwrap());
        assert!(matches!(
            Events::from_xml(&batch),
            Err(EnvelopeError::InvalidField { field: "Event", .. })
        ));
        assert!(matches!(
            Events::from_xml(&XmlNode::new("Batch")),
            Err(EnvelopeError::InvalidField { field: "Events", .. })
        ));
    }

    #[test]
    fn test_missing_event_id() {
        let mut value = json_event().to_json().unwrap();
        value.as_object_mut().unwrap().remove("EventId");
        assert!(matches!(
            Event::from_json(&value),
            Err(EnvelopeError::MissingField("EventId"))
        ));
    }

    #[test]
    fn test_events_common_content_type() {
        let events = Events::new(vec![json_event(), json_event()]);
        assert_eq!(events.common_content_type(), Some(&MimeType::json(Charset::Utf8)));
        assert_eq!(Events::default().common_content_type(), None);
    }

    #[test]
    fn test_events_roundtrip() {
        let events = Events::new(vec![json_event(), json_event()]);
        let json = events.to_json().unwrap();
        assert_eq!(json.as_array().map(Vec::len), Some(2));
        assert_eq!(Events::from_json(&json).unwrap(), events);

        let xml = events.to_xml().unwrap();
        assert_eq!(xml.name(), "Events");
        let reparsed = XmlNode::parse(&xml.to_xml_string().unwrap()).unwrap();
        assert_eq!(Events::from_xml(&reparsed).unwrap(), events);
    }
}
