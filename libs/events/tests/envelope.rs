//! Domain events through the fixture registry into envelopes and back.

use esc_codec::{Charset, MimeType, SerializationError, XmlNode};
use esc_events::{
    common_mime_type, serialize_all, to_envelopes, CommonEvent, Event, Events, Payload, SerializedEvent,
    SystemMeta, TypedPayload,
};
use esc_id::{EventId, EventType};
use esc_testing::{
    audit_json, book_added_json, codec_registry, data_type, BookAddedEvent, AUDIT, BLOB,
    BOOK_ADDED, BOOK_ADDED_EVENT, BOOK_REMOVED, NOTE,
};
use serde_json::json;

fn event_type(name: &str) -> EventType {
    EventType::new(name).unwrap()
}

fn book_added() -> CommonEvent {
    CommonEvent::new(EventId::new(), event_type(BOOK_ADDED), Payload::Json(book_added_json()))
        .with_meta(TypedPayload::new(data_type(AUDIT), Payload::Json(audit_json())))
}

#[test]
fn test_system_meta_exact_json() {
    let meta = SystemMeta::new(data_type("Foo"), MimeType::parse("application/json").unwrap());
    assert_eq!(
        serde_json::to_string(&meta.to_json()).unwrap(),
        r#"{"data-type":"Foo","data-content-type":"application/json"}"#
    );
}

#[test]
fn test_envelope_json_roundtrip() {
    let registry = codec_registry();
    let event = Event::from_common(&book_added(), &registry).unwrap();

    let json = event.to_json().unwrap();
    assert_eq!(json["Data"], book_added_json());
    assert_eq!(json["MetaData"]["data-type"], json!(BOOK_ADDED));
    assert_eq!(json["MetaData"]["meta-type"], json!(AUDIT));
    assert_eq!(json["MetaData"][AUDIT], audit_json());

    let decoded = Event::from_json_str(&event.to_json_string().unwrap()).unwrap();
    assert_eq!(decoded, event);
    let common = decoded.into_common();
    assert_eq!(common.id(), event.id());
    assert_eq!(common.data(), &Payload::Json(book_added_json()));
    assert_eq!(common.meta().map(|meta| &meta.payload), Some(&Payload::Json(audit_json())));
}

#[test]
fn test_envelope_xml_roundtrip_for_every_payload_kind() {
    let registry = codec_registry();
    let events = [
        book_added(),
        CommonEvent::new(
            EventId::new(),
            event_type(BOOK_ADDED_EVENT),
            Payload::Xml(
                XmlNode::new("book-added-event")
                    .with_attribute("name", "Shining")
                    .with_attribute("author", "Stephen King"),
            ),
        ),
        CommonEvent::new(EventId::new(), event_type(NOTE), Payload::Text("<b>keep</b> ]]> me".to_string())),
        CommonEvent::new(EventId::new(), event_type(BLOB), Payload::binary(vec![0_u8, 255, 7]))
            .with_meta(TypedPayload::new(data_type(BLOB), Payload::binary(vec![1_u8, 2]))),
    ];

    let envelopes = to_envelopes(&registry, &events).unwrap();
    let xml = envelopes.to_xml().unwrap().to_xml_string().unwrap();
    let decoded = Events::from_xml(&XmlNode::parse(&xml).unwrap()).unwrap();
    assert_eq!(decoded, envelopes);

    let json = envelopes.to_json().unwrap();
    assert_eq!(Events::from_json(&json).unwrap(), envelopes);
}

#[test]
fn test_serialized_event_roundtrip() {
    let registry = codec_registry();
    let event = book_added();

    let serialized = event.serialize(&registry).unwrap();
    assert_eq!(serialized.data().data(), br#"{"name":"Shining"}"#);
    assert_eq!(serialized.meta().map(|meta| meta.data_type().as_str()), Some(AUDIT));

    let restored = serialized.deserialize(&registry).unwrap();
    assert_eq!(restored, event);
    assert_eq!(restored.data(), event.data());
    assert_eq!(restored.meta(), event.meta());

    let envelope = Event::from_serialized(&serialized).unwrap();
    assert_eq!(envelope.to_serialized().unwrap(), serialized);
}

#[test]
fn test_class_bound_values() {
    let registry = codec_registry();
    let serialized = SerializedEvent::from_values(
        &registry,
        EventId::new(),
        event_type(BOOK_ADDED_EVENT),
        &BookAddedEvent::shining(),
        None,
    )
    .unwrap();
    assert_eq!(
        serialized.data().data(),
        br#"<book-added-event name="Shining" author="Stephen King"/>"#
    );

    let value = serialized.deserialize_data(&registry).unwrap();
    assert_eq!(value.downcast_ref::<BookAddedEvent>(), Some(&BookAddedEvent::shining()));

    let common = serialized.deserialize(&registry).unwrap();
    assert!(matches!(common.data(), Payload::Xml(node) if node.name() == "book-added-event"));
}

#[test]
fn test_typed_codec_guards_payload_type() {
    let registry = codec_registry();
    let event = CommonEvent::new(
        EventId::new(),
        event_type(BOOK_REMOVED),
        Payload::Json(json!({"name": "Shining", "reason": null})),
    );
    let err = event.serialize(&registry).unwrap_err();
    assert!(matches!(
        err,
        esc_events::EnvelopeError::Serialization(SerializationError::NotAssignable { .. })
    ));
}

#[test]
fn test_batch_mime_type() {
    let registry = codec_registry();
    let json_only = [book_added(), book_added()];
    assert_eq!(
        common_mime_type(&registry, &json_only).unwrap(),
        Some(MimeType::json(Charset::Utf8))
    );

    let mixed = [
        book_added(),
        CommonEvent::new(EventId::new(), event_type(NOTE), Payload::Text("x".to_string())),
    ];
    assert_eq!(common_mime_type(&registry, &mixed).unwrap(), None);
    assert_eq!(common_mime_type(&registry, &[]).unwrap(), None);

    let unknown = [CommonEvent::new(
        EventId::new(),
        event_type("Unknown"),
        Payload::Text("x".to_string()),
    )];
    assert!(common_mime_type(&registry, &unknown).unwrap_err().is_lookup_miss());
}

#[test]
fn test_serialize_all_keeps_order() {
    let registry = codec_registry();
    let events = [book_added(), book_added()];
    let serialized = serialize_all(&registry, &events).unwrap();
    let ids: Vec<_> = serialized.iter().map(SerializedEvent::id).collect();
    assert_eq!(ids, [events[0].id(), events[1].id()]);
}
