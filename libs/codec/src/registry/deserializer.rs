//! Deserializers keyed by logical type and mime type.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use esc_id::SerializedDataType;
use tracing::debug;

use crate::contract::Deserializer;
use crate::error::SerializationError;
use crate::mime::MimeType;

/// Resolves deserializers by `(type, mime type)`, with a per-type default mime type.
pub trait DeserializerRegistry: Send + Sync + fmt::Debug {
    /// Returns the deserializer for `data_type` and `mime_type`.
    ///
    /// Without a mime type, the type's default mime type is used; if none was
    /// configured the lookup fails.
    fn get_deserializer(
        &self,
        data_type: &SerializedDataType,
        mime_type: Option<&MimeType>,
    ) -> Result<Arc<dyn Deserializer>, SerializationError>;

    /// The default mime type configured for `data_type`, if any.
    fn default_mime_type(&self, data_type: &SerializedDataType) -> Option<&MimeType>;

    /// Non-failing probe for an exact `(type, mime type)` registration.
    fn has_deserializer(&self, data_type: &SerializedDataType, mime_type: &MimeType) -> bool;
}

type Entries = HashMap<SerializedDataType, Vec<(MimeType, Arc<dyn Deserializer>)>>;

/// Immutable deserializer registry snapshot.
#[derive(Debug, Clone, Default)]
pub struct SimpleDeserializerRegistry {
    deserializers: Entries,
    defaults: HashMap<SerializedDataType, MimeType>,
}

impl SimpleDeserializerRegistry {
    pub fn builder() -> DeserializerRegistryBuilder {
        DeserializerRegistryBuilder::new()
    }

    /// Number of `(type, mime type)` registrations.
    pub fn len(&self) -> usize {
        self.deserializers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mime types registered for `data_type`, in registration order.
    pub fn mime_types(&self, data_type: &SerializedDataType) -> impl Iterator<Item = &MimeType> {
        self.deserializers
            .get(data_type)
            .into_iter()
            .flatten()
            .map(|(mime_type, _)| mime_type)
    }

    fn lookup(
        &self,
        data_type: &SerializedDataType,
        mime_type: &MimeType,
    ) -> Option<&Arc<dyn Deserializer>> {
        let entries = self.deserializers.get(data_type)?;
        entries
            .iter()
            .find(|(candidate, _)| candidate == mime_type)
            .or_else(|| {
                entries
                    .iter()
                    .find(|(candidate, _)| candidate.match_encoding(mime_type))
            })
            .or_else(|| {
                // No encoding requested: the codec decodes with its own charset.
                if mime_type.encoding().is_some() {
                    return None;
                }
                entries.iter().find(|(candidate, _)| {
                    candidate.primary_type() == mime_type.primary_type()
                        && candidate.sub_type() == mime_type.sub_type()
                })
            })
            .map(|(_, deserializer)| deserializer)
    }
}

impl DeserializerRegistry for SimpleDeserializerRegistry {
    fn get_deserializer(
        &self,
        data_type: &SerializedDataType,
        mime_type: Option<&MimeType>,
    ) -> Result<Arc<dyn Deserializer>, SerializationError> {
        let mime_type = match mime_type {
            Some(mime_type) => mime_type,
            None => self.defaults.get(data_type).ok_or_else(|| {
                SerializationError::DefaultMimeTypeNotFound {
                    data_type: data_type.clone(),
                }
            })?,
        };

        self.lookup(data_type, mime_type)
            .cloned()
            .ok_or_else(|| SerializationError::DeserializerNotFound {
                data_type: data_type.clone(),
                mime_type: mime_type.clone(),
            })
    }

    fn default_mime_type(&self, data_type: &SerializedDataType) -> Option<&MimeType> {
        self.defaults.get(data_type)
    }

    fn has_deserializer(&self, data_type: &SerializedDataType, mime_type: &MimeType) -> bool {
        self.deserializers
            .get(data_type)
            .is_some_and(|entries| entries.iter().any(|(candidate, _)| candidate == mime_type))
    }
}

/// Accumulates deserializers for a [`SimpleDeserializerRegistry`].
#[derive(Debug, Default)]
pub struct DeserializerRegistryBuilder {
    deserializers: Entries,
    defaults: HashMap<SerializedDataType, MimeType>,
}

impl DeserializerRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a deserializer for `(type, mime type)`, replacing an exact match.
    pub fn add(
        &mut self,
        data_type: SerializedDataType,
        mime_type: MimeType,
        deserializer: Arc<dyn Deserializer>,
    ) -> &mut Self {
        let entries = self.deserializers.entry(data_type).or_default();
        match entries.iter_mut().find(|(candidate, _)| *candidate == mime_type) {
            Some(slot) => slot.1 = deserializer,
            None => entries.push((mime_type, deserializer)),
        }
        self
    }

    /// Registers a deserializer and makes its mime type the type's default.
    pub fn add_default(
        &mut self,
        data_type: SerializedDataType,
        mime_type: MimeType,
        deserializer: Arc<dyn Deserializer>,
    ) -> &mut Self {
        self.set_default_mime_type(data_type.clone(), mime_type.clone());
        self.add(data_type, mime_type, deserializer)
    }

    /// Sets the mime type used when a lookup names the type only.
    pub fn set_default_mime_type(
        &mut self,
        data_type: SerializedDataType,
        mime_type: MimeType,
    ) -> &mut Self {
        self.defaults.insert(data_type, mime_type);
        self
    }

    /// Returns the snapshot and starts a fresh, empty accumulation.
    pub fn build(&mut self) -> SimpleDeserializerRegistry {
        let registry = SimpleDeserializerRegistry {
            deserializers: std::mem::take(&mut self.deserializers),
            defaults: std::mem::take(&mut self.defaults),
        };
        debug!(
            deserializers = registry.len(),
            defaults = registry.defaults.len(),
            "built deserializer registry"
        );
        registry
    }
}
