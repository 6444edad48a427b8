//! Event storage for resumable SSE streams.
//!
//! When a store is configured, every frame written to an SSE stream is first
//! handed to [`EventStore::store_event`], and the returned event id is
//! stamped onto the frame (`id:` field). A client that reconnects with
//! `Last-Event-Id` gets the missed frames replayed through
//! [`EventStore::replay_events_after`] before live traffic resumes.
//!
//! Event ids are opaque to the transport; only the store interprets them.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use async_trait::async_trait;
use parking_lot::Mutex;
use rillmcp_protocol::JsonRpcMessage;

use crate::error::{TransportError, TransportResult};
use crate::sse::FrameSender;

/// Sink handed to [`EventStore::replay_events_after`].
///
/// The store calls [`ReplaySink::send`] once per historical event, in order.
/// Each call writes one frame into the freshly opened SSE body.
#[derive(Clone, Debug)]
pub struct ReplaySink {
    sender: FrameSender,
}

impl ReplaySink {
    pub(crate) fn new(sender: FrameSender) -> Self {
        Self { sender }
    }

    /// Emit one historical event onto the resumed connection.
    pub fn send(&self, event_id: &str, message: &JsonRpcMessage) -> TransportResult<()> {
        self.sender.write(Some(event_id), message)
    }
}

/// Contract for pluggable resumability backends.
#[async_trait]
pub trait EventStore: Send + Sync + fmt::Debug {
    /// Persist one outbound message and return its event id.
    ///
    /// Ids must be totally ordered within a stream, in the order events were
    /// stored. They are otherwise opaque.
    async fn store_event(
        &self,
        stream_id: &str,
        message: &JsonRpcMessage,
    ) -> TransportResult<String>;

    /// Replay every event after `last_event_id` into `sink`, in order.
    ///
    /// Returns the stream id under which subsequent live events for the
    /// resumed connection are to be registered.
    async fn replay_events_after(
        &self,
        last_event_id: &str,
        sink: &ReplaySink,
    ) -> TransportResult<String>;
}

/// In-memory event store with a bounded per-stream replay buffer.
///
/// Event ids are `"{stream_id}_{seq}"` with a per-stream monotonic sequence
/// number. Suitable for single-process deployments and tests; anything that
/// must survive a restart needs a persistent backend.
#[derive(Debug)]
pub struct InMemoryEventStore {
    max_events_per_stream: usize,
    streams: Mutex<HashMap<String, StreamEvents>>,
}

#[derive(Debug, Default)]
struct StreamEvents {
    next_seq: u64,
    events: VecDeque<StoredEvent>,
}

#[derive(Debug, Clone)]
struct StoredEvent {
    id: String,
    message: JsonRpcMessage,
}

impl InMemoryEventStore {
    /// Create a store keeping at most `max_events_per_stream` events per
    /// stream; older events are evicted first.
    pub fn new(max_events_per_stream: usize) -> Self {
        Self {
            max_events_per_stream,
            streams: Mutex::new(HashMap::new()),
        }
    }

    /// Number of buffered events for `stream_id`.
    pub fn event_count(&self, stream_id: &str) -> usize {
        self.streams
            .lock()
            .get(stream_id)
            .map_or(0, |stream| stream.events.len())
    }
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn store_event(
        &self,
        stream_id: &str,
        message: &JsonRpcMessage,
    ) -> TransportResult<String> {
        let mut streams = self.streams.lock();
        let stream = streams.entry(stream_id.to_owned()).or_default();
        let id = format!("{stream_id}_{}", stream.next_seq);
        stream.next_seq += 1;
        if stream.events.len() >= self.max_events_per_stream {
            stream.events.pop_front();
        }
        stream.events.push_back(StoredEvent {
            id: id.clone(),
            message: message.clone(),
        });
        Ok(id)
    }

    async fn replay_events_after(
        &self,
        last_event_id: &str,
        sink: &ReplaySink,
    ) -> TransportResult<String> {
        let (stream_id, events) = {
            let streams = self.streams.lock();
            let Some((stream_id, _seq)) = last_event_id.rsplit_once('_') else {
                return Err(TransportError::EventStore(format!(
                    "malformed event ID: {last_event_id}"
                )));
            };
            let Some(stream) = streams.get(stream_id) else {
                return Err(TransportError::EventStore(format!(
                    "unknown stream for event ID: {last_event_id}"
                )));
            };
            let mut found = false;
            let events: Vec<StoredEvent> = stream
                .events
                .iter()
                .filter(|event| {
                    if found {
                        true
                    } else {
                        found = event.id == last_event_id;
                        false
                    }
                })
                .cloned()
                .collect();
            (stream_id.to_owned(), events)
        };

        for event in &events {
            sink.send(&event.id, &event.message)?;
        }
        Ok(stream_id)
    }
}
