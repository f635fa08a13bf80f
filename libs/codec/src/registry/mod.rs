//! Build-once, read-many lookup tables from logical types to codecs and classes.
//!
//! Every registry is assembled through a builder. `build()` hands out an
//! immutable snapshot and leaves the builder empty, so a snapshot already handed
//! out is never mutated by later `add` calls. Snapshots are `Send + Sync` and
//! can be shared behind an `Arc` without locking; builders are single-writer
//! configuration-time objects.

mod combined;
mod data_type;
mod deserializer;
mod serializer;

pub use combined::{SerDeserializerRegistryBuilder, SimpleSerDeserializerRegistry};
pub use data_type::{
    SerializedDataTypeRegistry, SerializedDataTypeRegistryBuilder,
    SimpleSerializedDataTypeRegistry,
};
pub use deserializer::{DeserializerRegistry, DeserializerRegistryBuilder, SimpleDeserializerRegistry};
pub use serializer::{SerializerRegistry, SerializerRegistryBuilder, SimpleSerializerRegistry};
