//! The store contracts, exercised through an in-memory double.

use std::collections::HashMap;
use std::sync::Mutex;

use esc_events::{CommonEvent, ExpectedVersion, Payload, ReadRange, ReadableEventStore, WritableEventStore};
use esc_id::{EventId, EventType, StreamId};
use thiserror::Error;

#[derive(Debug, Error)]
enum StoreError {
    #[error("stream is at version {actual}, expected {expected:?}")]
    WrongVersion { expected: ExpectedVersion, actual: u64 },
}

#[derive(Default)]
struct InMemoryStore {
    streams: Mutex<HashMap<StreamId, Vec<CommonEvent>>>,
}

impl WritableEventStore for InMemoryStore {
    type Error = StoreError;

    fn append(
        &self,
        stream: &StreamId,
        expected: ExpectedVersion,
        events: &[CommonEvent],
    ) -> Result<u64, Self::Error> {
        let mut streams = self.streams.lock().unwrap();
        let current = streams.get(stream).map(Vec::len);
        let ok = match (expected, current) {
            (ExpectedVersion::Any, _) => true,
            (ExpectedVersion::NoStream, None) => true,
            (ExpectedVersion::Exact(version), Some(len)) => version == len as u64,
            _ => false,
        };
        if !ok {
            return Err(StoreError::WrongVersion {
                expected,
                actual: current.unwrap_or(0) as u64,
            });
        }
        let entries = streams.entry(stream.clone()).or_default();
        entries.extend_from_slice(events);
        Ok(entries.len() as u64)
    }
}

impl ReadableEventStore for InMemoryStore {
    type Error = StoreError;

    fn read(&self, stream: &StreamId, range: ReadRange) -> Result<Vec<CommonEvent>, Self::Error> {
        let streams = self.streams.lock().unwrap();
        Ok(streams
            .get(stream)
            .map(|events| {
                events
                    .iter()
                    .skip(range.start as usize)
                    .take(range.count)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

fn note(text: &str) -> CommonEvent {
    CommonEvent::new(
        EventId::new(),
        EventType::new("Note").unwrap(),
        Payload::Text(text.to_string()),
    )
}

#[test]
fn test_append_then_read() {
    let store = InMemoryStore::default();
    let stream = StreamId::new("books-1").unwrap();
    let events = [note("a"), note("b"), note("c")];

    let version = store.append(&stream, ExpectedVersion::NoStream, &events).unwrap();
    assert_eq!(version, 3);

    let all = store.read(&stream, ReadRange::all()).unwrap();
    assert_eq!(all, events);
    let tail = store.read(&stream, ReadRange::new(1, 1)).unwrap();
    assert_eq!(tail, [events[1].clone()]);
}

#[test]
fn test_version_conflict() {
    let store = InMemoryStore::default();
    let stream = StreamId::new("books-1").unwrap();
    store.append(&stream, ExpectedVersion::Any, &[note("a")]).unwrap();

    assert!(store.append(&stream, ExpectedVersion::NoStream, &[note("b")]).is_err());
    assert!(store.append(&stream, ExpectedVersion::Exact(0), &[note("b")]).is_err());
    assert_eq!(store.append(&stream, ExpectedVersion::Exact(1), &[note("b")]).unwrap(), 2);
}

#[test]
fn test_missing_stream_reads_empty() {
    let store = InMemoryStore::default();
    let stream = StreamId::new("nothing").unwrap();
    assert!(store.read(&stream, ReadRange::all()).unwrap().is_empty());
}
