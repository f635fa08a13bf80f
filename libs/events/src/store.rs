//! Contracts of the event store this layer feeds.
//!
//! Only the shapes are declared here; storage, ordering and concurrency control
//! belong to the implementations.

use esc_id::StreamId;
use serde::{Deserialize, Serialize};

use crate::event::CommonEvent;

/// Version a writer expects a stream to be at before appending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "version")]
pub enum ExpectedVersion {
    /// Append regardless of the current version.
    #[default]
    Any,
    /// The stream must not exist yet.
    NoStream,
    /// The stream must be at exactly this version.
    Exact(u64),
}

/// A window of a stream, counted in events from `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReadRange {
    pub start: u64,
    pub count: usize,
}

impl ReadRange {
    pub fn new(start: u64, count: usize) -> Self {
        Self { start, count }
    }

    /// The whole stream.
    pub fn all() -> Self {
        Self::new(0, usize::MAX)
    }
}

/// Reads events back from a stream.
pub trait ReadableEventStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Events of `stream` within `range`, oldest first. A missing stream reads as empty.
    fn read(&self, stream: &StreamId, range: ReadRange) -> Result<Vec<CommonEvent>, Self::Error>;
}

/// Appends events to a stream.
pub trait WritableEventStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Appends `events` if the stream is at `expected`, returning the stream's new version.
    fn append(
        &self,
        stream: &StreamId,
        expected: ExpectedVersion,
        events: &[CommonEvent],
    ) -> Result<u64, Self::Error>;
}
