//! Codecs registered for both directions at once.

use std::sync::Arc;

use esc_id::SerializedDataType;
use tracing::debug;

use super::deserializer::{DeserializerRegistry, DeserializerRegistryBuilder, SimpleDeserializerRegistry};
use super::serializer::{SerializerRegistry, SerializerRegistryBuilder, SimpleSerializerRegistry};
use crate::contract::{Deserializer, Serializer};
use crate::error::SerializationError;
use crate::mime::MimeType;

/// A serializer registry and a deserializer registry built together.
#[derive(Debug, Clone, Default)]
pub struct SimpleSerDeserializerRegistry {
    serializers: SimpleSerializerRegistry,
    deserializers: SimpleDeserializerRegistry,
}

impl SimpleSerDeserializerRegistry {
    pub fn builder() -> SerDeserializerRegistryBuilder {
        SerDeserializerRegistryBuilder::new()
    }

    pub fn serializers(&self) -> &SimpleSerializerRegistry {
        &self.serializers
    }

    pub fn deserializers(&self) -> &SimpleDeserializerRegistry {
        &self.deserializers
    }

    pub fn into_parts(self) -> (SimpleSerializerRegistry, SimpleDeserializerRegistry) {
        (self.serializers, self.deserializers)
    }
}

impl SerializerRegistry for SimpleSerDeserializerRegistry {
    fn get_serializer(
        &self,
        data_type: &SerializedDataType,
    ) -> Result<Arc<dyn Serializer>, SerializationError> {
        self.serializers.get_serializer(data_type)
    }

    fn exists(&self, data_type: &SerializedDataType) -> bool {
        self.serializers.exists(data_type)
    }
}

impl DeserializerRegistry for SimpleSerDeserializerRegistry {
    fn get_deserializer(
        &self,
        data_type: &SerializedDataType,
        mime_type: Option<&MimeType>,
    ) -> Result<Arc<dyn Deserializer>, SerializationError> {
        self.deserializers.get_deserializer(data_type, mime_type)
    }

    fn default_mime_type(&self, data_type: &SerializedDataType) -> Option<&MimeType> {
        self.deserializers.default_mime_type(data_type)
    }

    fn has_deserializer(&self, data_type: &SerializedDataType, mime_type: &MimeType) -> bool {
        self.deserializers.has_deserializer(data_type, mime_type)
    }
}

/// Builder for [`SimpleSerDeserializerRegistry`].
///
/// A codec is registered as the type's serializer and as its deserializer for
/// the codec's own mime type in one call.
#[derive(Debug, Default)]
pub struct SerDeserializerRegistryBuilder {
    serializers: SerializerRegistryBuilder,
    deserializers: DeserializerRegistryBuilder,
}

impl SerDeserializerRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `codec` in both directions under its mime type.
    pub fn add<C>(&mut self, data_type: SerializedDataType, codec: Arc<C>) -> &mut Self
    where
        C: Serializer + Deserializer + 'static,
    {
        let mime_type = codec.mime_type().clone();
        self.serializers.add(data_type.clone(), codec.clone());
        self.deserializers.add(data_type, mime_type, codec);
        self
    }

    /// Like [`add`](Self::add), and makes the codec's mime type the type's default.
    pub fn add_default<C>(&mut self, data_type: SerializedDataType, codec: Arc<C>) -> &mut Self
    where
        C: Serializer + Deserializer + 'static,
    {
        let mime_type = codec.mime_type().clone();
        self.deserializers
            .set_default_mime_type(data_type.clone(), mime_type);
        self.add(data_type, codec)
    }

    /// Adds a deserializer only, e.g. for a legacy wire format that is read but no longer written.
    pub fn add_deserializer(
        &mut self,
        data_type: SerializedDataType,
        mime_type: MimeType,
        deserializer: Arc<dyn Deserializer>,
    ) -> &mut Self {
        self.deserializers.add(data_type, mime_type, deserializer);
        self
    }

    pub fn set_default_mime_type(
        &mut self,
        data_type: SerializedDataType,
        mime_type: MimeType,
    ) -> &mut Self {
        self.deserializers.set_default_mime_type(data_type, mime_type);
        self
    }

    /// Returns the snapshot and starts a fresh, empty accumulation.
    pub fn build(&mut self) -> SimpleSerDeserializerRegistry {
        let registry = SimpleSerDeserializerRegistry {
            serializers: self.serializers.build(),
            deserializers: self.deserializers.build(),
        };
        debug!(
            serializers = registry.serializers.len(),
            deserializers = registry.deserializers.len(),
            "built combined registry"
        );
        registry
    }
}
