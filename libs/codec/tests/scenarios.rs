//! End-to-end flows through the fixture registry.

use std::sync::Arc;

use esc_codec::{
    common_mime_type, deserialize, deserialize_as, serialize, Base64Payload, Charset,
    DeserializerRegistry, Input, JsonCodec, MimeType, SerializationError, SerializedData,
    SerializerRegistry, SimpleDeserializerRegistry, SimpleSerializerRegistry, XmlNode,
};
use esc_testing::{
    codec_registry, data_type, BookAddedEvent, BookRemoved, AUDIT, BLOB, BOOK_ADDED,
    BOOK_ADDED_EVENT, BOOK_REMOVED, NOTE,
};
use serde_json::{json, Value};

#[test]
fn test_json_payload_through_registry() {
    let registry = SimpleSerializerRegistry::builder()
        .add(data_type(BOOK_ADDED), Arc::new(JsonCodec::new()))
        .build();
    let serializer = registry.get_serializer(&data_type(BOOK_ADDED)).unwrap();
    assert_eq!(serializer.mime_type().base_type(), MimeType::APPLICATION_JSON);

    let bytes = serializer
        .marshal(&json!({"name": "Shining"}), &data_type(BOOK_ADDED))
        .unwrap();
    assert_eq!(String::from_utf8(bytes.clone()).unwrap(), r#"{"name":"Shining"}"#);

    let deserializers = SimpleDeserializerRegistry::builder()
        .add(
            data_type(BOOK_ADDED),
            MimeType::json(Charset::Utf8),
            Arc::new(JsonCodec::new()),
        )
        .build();
    let value = deserializers
        .get_deserializer(&data_type(BOOK_ADDED), Some(serializer.mime_type()))
        .unwrap()
        .unmarshal(Input::Bytes(&bytes), &data_type(BOOK_ADDED), serializer.mime_type())
        .unwrap();
    assert_eq!(value.downcast_ref::<Value>(), Some(&json!({"name": "Shining"})));
}

#[test]
fn test_xml_bound_payload() {
    let registry = codec_registry();
    let data = serialize(
        &registry,
        &data_type(BOOK_ADDED_EVENT),
        Some(&BookAddedEvent::shining()),
    )
    .unwrap()
    .unwrap();
    assert_eq!(
        String::from_utf8(data.data().to_vec()).unwrap(),
        r#"<book-added-event name="Shining" author="Stephen King"/>"#
    );

    let restored: BookAddedEvent = deserialize_as(&registry, &data).unwrap();
    assert_eq!(restored, BookAddedEvent::shining());
}

#[test]
fn test_default_mime_type_lookup() {
    let registry = codec_registry();
    let deserializer = registry.get_deserializer(&data_type(NOTE), None).unwrap();
    let value = deserializer
        .unmarshal(
            Input::Bytes(b"hello"),
            &data_type(NOTE),
            &MimeType::text(Charset::Utf8),
        )
        .unwrap();
    assert_eq!(value.downcast_ref::<String>().map(String::as_str), Some("hello"));

    let without_default = SimpleDeserializerRegistry::builder()
        .add(
            data_type("Foo"),
            MimeType::json(Charset::Utf8),
            Arc::new(JsonCodec::new()),
        )
        .build();
    let err = without_default
        .get_deserializer(&data_type("Foo"), None)
        .unwrap_err();
    assert!(err.is_lookup_miss());
    assert!(err.to_string().contains("Foo"));
}

#[test]
fn test_every_codec_roundtrips() {
    let registry = codec_registry();

    let book = serialize(&registry, &data_type(BOOK_ADDED), Some(&json!({"name": "Shining"})))
        .unwrap()
        .unwrap();
    assert_eq!(
        deserialize_as::<Value, _>(&registry, &book).unwrap(),
        json!({"name": "Shining"})
    );

    let removed = BookRemoved {
        name: "Shining".to_string(),
        reason: None,
    };
    let data = serialize(&registry, &data_type(BOOK_REMOVED), Some(&removed))
        .unwrap()
        .unwrap();
    assert_eq!(deserialize_as::<BookRemoved, _>(&registry, &data).unwrap(), removed);

    let note = serialize(&registry, &data_type(NOTE), Some(&"plain <text>".to_string()))
        .unwrap()
        .unwrap();
    assert_eq!(deserialize_as::<String, _>(&registry, &note).unwrap(), "plain <text>");

    for bytes in [Vec::new(), vec![0_u8, 159, 146, 150]] {
        let blob = serialize(&registry, &data_type(BLOB), Some(&bytes))
            .unwrap()
            .unwrap();
        assert_eq!(deserialize_as::<Vec<u8>, _>(&registry, &blob).unwrap(), bytes);
    }
}

#[test]
fn test_native_structures_pass_through() {
    let registry = codec_registry();

    let node = XmlNode::new("book-added-event").with_attribute("name", "Shining");
    let value = registry
        .get_deserializer(&data_type(BOOK_ADDED_EVENT), None)
        .unwrap()
        .unmarshal(
            Input::Native(Box::new(node.clone())),
            &data_type(BOOK_ADDED_EVENT),
            &MimeType::xml(Charset::Utf8),
        )
        .unwrap();
    assert_eq!(value.downcast_ref::<XmlNode>(), Some(&node));

    let payload = Base64Payload::from_bytes(vec![1_u8, 2, 3]);
    let value = registry
        .get_deserializer(&data_type(BLOB), None)
        .unwrap()
        .unmarshal(
            Input::Native(Box::new(payload.clone())),
            &data_type(BLOB),
            &MimeType::octet_stream(),
        )
        .unwrap();
    assert_eq!(value.downcast_ref::<Base64Payload>(), Some(&payload));
}

#[test]
fn test_unregistered_mime_type_is_a_miss() {
    let registry = codec_registry();
    let data = SerializedData::new(data_type(BOOK_ADDED), MimeType::xml(Charset::Utf8), b"<a/>".to_vec());
    let err = deserialize(&registry, &data).unwrap_err();
    assert!(matches!(err, SerializationError::DeserializerNotFound { .. }));
}

#[test]
fn test_bare_content_type_decodes_with_codec_charset() {
    let registry = SimpleDeserializerRegistry::builder()
        .add_default(
            data_type("Foo"),
            MimeType::json(Charset::Utf8),
            Arc::new(JsonCodec::new()),
        )
        .build();
    let data = SerializedData::new(
        data_type("Foo"),
        MimeType::parse("application/json").unwrap(),
        r#"{"name":"Shining"}"#.as_bytes().to_vec(),
    );

    let value: Value = deserialize_as(&registry, &data).unwrap();
    assert_eq!(value, json!({"name": "Shining"}));
}

#[test]
fn test_batch_mime_type() {
    let registry = codec_registry();
    let json_types = [data_type(BOOK_ADDED), data_type(AUDIT), data_type(BOOK_REMOVED)];
    assert_eq!(
        common_mime_type(&registry, &json_types).unwrap(),
        Some(MimeType::json(Charset::Utf8))
    );

    let mixed = [data_type(BOOK_ADDED), data_type(BOOK_ADDED_EVENT)];
    assert_eq!(common_mime_type(&registry, &mixed).unwrap(), None);
}

#[test]
fn test_registry_shared_across_threads() {
    let registry = Arc::new(codec_registry());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                let value = json!({"n": i});
                let data = serialize(registry.as_ref(), &data_type(BOOK_ADDED), Some(&value))
                    .unwrap()
                    .unwrap();
                deserialize_as::<Value, _>(registry.as_ref(), &data).unwrap() == value
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
