//! Serializers keyed by logical type.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use esc_id::SerializedDataType;
use tracing::debug;

use crate::contract::Serializer;
use crate::error::SerializationError;

/// Resolves the single serializer configured for a logical type.
pub trait SerializerRegistry: Send + Sync + fmt::Debug {
    /// Returns the serializer for `data_type`, or a lookup-miss error.
    fn get_serializer(
        &self,
        data_type: &SerializedDataType,
    ) -> Result<Arc<dyn Serializer>, SerializationError>;

    /// Non-failing probe for a registered serializer.
    fn exists(&self, data_type: &SerializedDataType) -> bool;
}

/// Immutable serializer registry snapshot.
#[derive(Debug, Clone, Default)]
pub struct SimpleSerializerRegistry {
    serializers: HashMap<SerializedDataType, Arc<dyn Serializer>>,
}

impl SimpleSerializerRegistry {
    pub fn builder() -> SerializerRegistryBuilder {
        SerializerRegistryBuilder::new()
    }

    pub fn len(&self) -> usize {
        self.serializers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.serializers.is_empty()
    }

    /// Registered types, in no particular order.
    pub fn data_types(&self) -> impl Iterator<Item = &SerializedDataType> {
        self.serializers.keys()
    }
}

impl SerializerRegistry for SimpleSerializerRegistry {
    fn get_serializer(
        &self,
        data_type: &SerializedDataType,
    ) -> Result<Arc<dyn Serializer>, SerializationError> {
        self.serializers
            .get(data_type)
            .cloned()
            .ok_or_else(|| SerializationError::SerializerNotFound {
                data_type: data_type.clone(),
            })
    }

    fn exists(&self, data_type: &SerializedDataType) -> bool {
        self.serializers.contains_key(data_type)
    }
}

/// Accumulates serializers for a [`SimpleSerializerRegistry`].
#[derive(Debug, Default)]
pub struct SerializerRegistryBuilder {
    serializers: HashMap<SerializedDataType, Arc<dyn Serializer>>,
}

impl SerializerRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the serializer for a type, replacing any previous one.
    pub fn add(
        &mut self,
        data_type: SerializedDataType,
        serializer: Arc<dyn Serializer>,
    ) -> &mut Self {
        self.serializers.insert(data_type, serializer);
        self
    }

    /// Returns the snapshot and starts a fresh, empty accumulation.
    pub fn build(&mut self) -> SimpleSerializerRegistry {
        let serializers = std::mem::take(&mut self.serializers);
        debug!(serializers = serializers.len(), "built serializer registry");
        SimpleSerializerRegistry { serializers }
    }
}

#[cfg(test)]
mod tests {
    use crate::codecs::{JsonCodec, TextCodec};

    use super::*;

    fn data_type(name: &str) -> SerializedDataType {
        SerializedDataType::new(name).unwrap()
    }

    #[test]
    fn test_add_then_get() {
        let codec: Arc<dyn Serializer> = Arc::new(JsonCodec::new());
        let registry = SimpleSerializerRegistry::builder()
            .add(data_type("BookAdded"), codec.clone())
            .build();

        assert!(registry.exists(&data_type("BookAdded")));
        let found = registry.get_serializer(&data_type("BookAdded")).unwrap();
        assert!(Arc::ptr_eq(&found, &codec));
    }

    #[test]
    fn test_missing_type_fails() {
        let registry = SimpleSerializerRegistry::builder().build();
        assert!(!registry.exists(&data_type("BookAdded")));
        let err = registry.get_serializer(&data_type("BookAdded")).unwrap_err();
        assert!(err.is_lookup_miss());
        assert!(err.to_string().contains("BookAdded"));
    }

    #[test]
    fn test_build_resets_builder() {
        let mut builder = SerializerRegistryBuilder::new();
        builder.add(data_type("A"), Arc::new(TextCodec::new()));
        let first = builder.build();

        builder.add(data_type("B"), Arc::new(TextCodec::new()));
        let second = builder.build();

        assert!(first.exists(&data_type("A")));
        assert!(!first.exists(&data_type("B")));
        assert!(second.exists(&data_type("B")));
        assert!(!second.exists(&data_type("A")));
    }
}
