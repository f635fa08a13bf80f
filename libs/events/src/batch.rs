//! Helpers for writing several events at once.

use esc_codec::{MimeType, SerializationError, SerializerRegistry};
use esc_id::SerializedDataType;

use crate::error::EnvelopeError;
use crate::event::{CommonEvent, Event, Events, SerializedEvent};

/// The mime type shared by the serializers of every event's data and metadata.
///
/// Returns `Ok(None)` for an empty batch or when the serializers disagree, in
/// which case the batch cannot be written in a single wire format.
pub fn common_mime_type<R>(
    registry: &R,
    events: &[CommonEvent],
) -> Result<Option<MimeType>, SerializationError>
where
    R: SerializerRegistry + ?Sized,
{
    let data_types: Vec<SerializedDataType> = events
        .iter()
        .flat_map(|event| {
            let meta_type = event.meta().map(|meta| meta.data_type.clone());
            std::iter::once(event.data_type()).chain(meta_type)
        })
        .collect();
    esc_codec::common_mime_type(registry, &data_types)
}

/// Wraps every event in an envelope, in order.
pub fn to_envelopes<R>(registry: &R, events: &[CommonEvent]) -> Result<Events, EnvelopeError>
where
    R: SerializerRegistry + ?Sized,
{
    events
        .iter()
        .map(|event| Event::from_common(event, registry))
        .collect::<Result<Vec<_>, _>>()
        .map(Events::new)
}

/// Serializes every event through `registry`, in order.
pub fn serialize_all<R>(registry: &R, events: &[CommonEvent]) -> Result<Vec<SerializedEvent>, EnvelopeError>
where
    R: SerializerRegistry + ?Sized,
{
    events.iter().map(|event| event.serialize(registry)).collect()
}
