//! Logical type names mapped to payload classes.

use std::collections::HashMap;
use std::fmt;

use esc_id::SerializedDataType;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::class::PayloadClass;
use crate::error::SerializationError;

/// Maps a logical type name to the concrete class class-bound codecs materialize.
pub trait SerializedDataTypeRegistry: Send + Sync + fmt::Debug {
    /// Returns the class for `data_type`, or a lookup-miss error naming the type.
    fn find_class(&self, data_type: &SerializedDataType) -> Result<&PayloadClass, SerializationError>;

    fn contains(&self, data_type: &SerializedDataType) -> bool;
}

/// Immutable type registry snapshot.
#[derive(Debug, Clone, Default)]
pub struct SimpleSerializedDataTypeRegistry {
    classes: HashMap<SerializedDataType, PayloadClass>,
}

impl SimpleSerializedDataTypeRegistry {
    pub fn builder() -> SerializedDataTypeRegistryBuilder {
        SerializedDataTypeRegistryBuilder::new()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl SerializedDataTypeRegistry for SimpleSerializedDataTypeRegistry {
    fn find_class(&self, data_type: &SerializedDataType) -> Result<&PayloadClass, SerializationError> {
        self.classes
            .get(data_type)
            .ok_or_else(|| SerializationError::ClassNotFound {
                data_type: data_type.clone(),
            })
    }

    fn contains(&self, data_type: &SerializedDataType) -> bool {
        self.classes.contains_key(data_type)
    }
}

/// Accumulates classes for a [`SimpleSerializedDataTypeRegistry`].
#[derive(Debug, Default)]
pub struct SerializedDataTypeRegistryBuilder {
    classes: HashMap<SerializedDataType, PayloadClass>,
}

impl SerializedDataTypeRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, data_type: SerializedDataType, class: PayloadClass) -> &mut Self {
        self.classes.insert(data_type, class);
        self
    }

    /// Shorthand for `add(data_type, PayloadClass::of::<T>())`.
    pub fn add_class<T>(&mut self, data_type: SerializedDataType) -> &mut Self
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        self.add(data_type, PayloadClass::of::<T>())
    }

    /// Returns the snapshot and starts a fresh, empty accumulation.
    pub fn build(&mut self) -> SimpleSerializedDataTypeRegistry {
        let classes = std::mem::take(&mut self.classes);
        debug!(classes = classes.len(), "built data type registry");
        SimpleSerializedDataTypeRegistry { classes }
    }
}
