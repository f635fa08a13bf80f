//! Typed name and identifier definitions.
//!
//! Names are validated strings; event IDs are UUIDs.

use uuid::Uuid;

use crate::define_name;

// =============================================================================
// Type Names
// =============================================================================

define_name!(
    /// Unique logical name of a serialized payload type.
    ///
    /// This is the primary key of every serializer, deserializer and payload class
    /// registry.
    SerializedDataType,
    "serialized data type"
);

define_name!(
    /// Domain-level type of an event.
    EventType,
    "event type"
);

define_name!(
    /// Identifier of an event stream.
    StreamId,
    "stream id"
);

impl From<EventType> for SerializedDataType {
    fn from(event_type: EventType) -> Self {
        Self(event_type.0)
    }
}

impl From<&EventType> for SerializedDataType {
    fn from(event_type: &EventType) -> Self {
        Self(event_type.0.clone())
    }
}

impl From<SerializedDataType> for EventType {
    fn from(data_type: SerializedDataType) -> Self {
        Self(data_type.0)
    }
}

// =============================================================================
// Events
// =============================================================================

/// Event ID is a UUID chosen by the producer of the event.
///
/// Equality and hashing are defined on the UUID alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random (v4) event ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an event ID from a raw UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        self.0
    }

    /// Parses an event ID from its hyphenated UUID form.
    pub fn parse(s: &str) -> Result<Self, crate::IdError> {
        if s.is_empty() {
            return Err(crate::IdError::Empty { kind: "event id" });
        }
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| crate::IdError::InvalidUuid(e.to_string()))
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl std::str::FromStr for EventId {
    type Err = crate::IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Uuid> for EventId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<EventId> for Uuid {
    fn from(id: EventId) -> Self {
        id.0
    }
}

impl serde::Serialize for EventId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for EventId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_data_type_roundtrip() {
        let data_type = SerializedDataType::new("BookAdded").unwrap();
        let parsed: SerializedDataType = data_type.to_string().parse().unwrap();
        assert_eq!(data_type, parsed);
    }

    #[test]
    fn test_data_type_case_sensitive() {
        let upper = SerializedDataType::new("BookAdded").unwrap();
        let lower = SerializedDataType::new("bookadded").unwrap();
        assert_ne!(upper, lower);
    }

    #[test]
    fn test_data_type_empty() {
        let result = SerializedDataType::new("");
        assert!(result.unwrap_err().is_empty());
    }

    #[test]
    fn test_data_type_control_character() {
        let result: Result<SerializedDataType, _> = "Book\nAdded".parse();
        assert!(matches!(
            result.unwrap_err(),
            crate::IdError::InvalidCharacter { character: '\n', .. }
        ));
    }

    #[test]
    fn test_data_type_too_long() {
        let result = SerializedDataType::new("x".repeat(crate::MAX_NAME_LENGTH + 1));
        assert!(matches!(result.unwrap_err(), crate::IdError::TooLong { .. }));
    }

    #[test]
    fn test_data_type_borrow_lookup() {
        let mut map = HashMap::new();
        map.insert(SerializedDataType::new("BookAdded").unwrap(), 1);
        assert_eq!(map.get("BookAdded"), Some(&1));
    }

    #[test]
    fn test_data_type_json_rejects_empty() {
        let result: Result<SerializedDataType, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_event_type_converts_to_data_type() {
        let event_type = EventType::new("BookAdded").unwrap();
        let data_type = SerializedDataType::from(&event_type);
        assert_eq!(data_type.as_str(), event_type.as_str());
    }

    #[test]
    fn test_event_id_roundtrip() {
        let id = EventId::new();
        let parsed: EventId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_event_id_json_roundtrip() {
        let id = EventId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
        let parsed: EventId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_event_id_invalid() {
        assert!(matches!(
            "not-a-uuid".parse::<EventId>().unwrap_err(),
            crate::IdError::InvalidUuid(_)
        ));
        assert!("".parse::<EventId>().unwrap_err().is_empty());
    }

    proptest! {
        #[test]
        fn prop_printable_names_roundtrip(name in "[A-Za-z][A-Za-z0-9._-]{0,40}") {
            let data_type = SerializedDataType::new(name.clone()).unwrap();
            prop_assert_eq!(data_type.as_str(), name.as_str());
            let json = serde_json::to_string(&data_type).unwrap();
            let parsed: SerializedDataType = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(parsed, data_type);
        }
    }
}
