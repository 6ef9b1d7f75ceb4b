//! SSE Event Replay Store
//!
//! Server-side half of the SSE resumption contract: every event emitted on
//! a stream is recorded under a monotonically increasing event id, and a
//! reconnecting client presenting `Last-Event-ID` gets everything after it
//! replayed. The store is pluggable; the bundled implementation is an
//! in-memory buffer bounded by entry count and age.
//!
//! Replay is at-least-once: consumers must tolerate events they have
//! already seen.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::protocol::JsonRpcMessage;
use crate::transport::error::TransportResult;

/// Pluggable storage for emitted SSE events, keyed by stream
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Record an emitted message, returning its assigned event id
    async fn store(&self, stream_id: &str, message: JsonRpcMessage) -> TransportResult<String>;

    /// Return all events on the stream with ids after `last_event_id`,
    /// oldest first
    async fn replay_after(
        &self,
        stream_id: &str,
        last_event_id: &str,
    ) -> TransportResult<Vec<(String, JsonRpcMessage)>>;

    /// Drop expired entries; returns how many were removed
    async fn cleanup(&self) -> TransportResult<usize>;
}

#[derive(Debug, Clone)]
struct StoredEvent {
    id: u64,
    message: JsonRpcMessage,
    stored_at: Instant,
}

/// In-memory [`EventStore`] bounded by entry count and age
///
/// Event ids are a single monotone counter shared across streams, so an id
/// comparison is meaningful within and across reconnects of one stream.
/// When a stream exceeds `max_events`, the oldest entries are evicted
/// first; `cleanup` drops entries older than `expiration`.
///
/// # Examples
///
/// ```rust
/// use tether_mcp::transport::{EventStore, InMemoryEventStore};
/// use tether_mcp::protocol::{JsonRpcMessage, JsonRpcNotification};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryEventStore::with_defaults();
/// let message: JsonRpcMessage =
///     JsonRpcNotification::new("notifications/progress", None).into();
///
/// let id = store.store("stream-1", message).await?;
/// let replayed = store.replay_after("stream-1", "0").await?;
/// assert_eq!(replayed.len(), 1);
/// assert_eq!(replayed[0].0, id);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct InMemoryEventStore {
    streams: DashMap<String, VecDeque<StoredEvent>>,
    next_id: AtomicU64,
    max_events: usize,
    expiration: Duration,
}

impl InMemoryEventStore {
    /// Create a store with explicit bounds
    pub fn new(max_events: usize, expiration: Duration) -> Self {
        Self {
            streams: DashMap::new(),
            next_id: AtomicU64::new(1),
            max_events,
            expiration,
        }
    }

    /// Create a store with the default bounds
    pub fn with_defaults() -> Self {
        use crate::protocol::constants::defaults;
        Self::new(
            defaults::EVENT_STORE_MAX_EVENTS,
            defaults::EVENT_STORE_EXPIRATION,
        )
    }

    /// Number of retained events on one stream
    pub fn stream_len(&self, stream_id: &str) -> usize {
        self.streams
            .get(stream_id)
            .map(|events| events.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn store(&self, stream_id: &str, message: JsonRpcMessage) -> TransportResult<String> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut events = self.streams.entry(stream_id.to_string()).or_default();

        events.push_back(StoredEvent {
            id,
            message,
            stored_at: Instant::now(),
        });

        while events.len() > self.max_events {
            events.pop_front();
        }

        Ok(id.to_string())
    }

    async fn replay_after(
        &self,
        stream_id: &str,
        last_event_id: &str,
    ) -> TransportResult<Vec<(String, JsonRpcMessage)>> {
        // An unparseable id has no position in the stream; treat it as
        // "from the beginning" and replay everything rather than failing
        // the reconnect. Replay is at-least-once, so consumers already
        // tolerate redelivery.
        let after: u64 = last_event_id.parse().unwrap_or(0);

        let Some(events) = self.streams.get(stream_id) else {
            return Ok(Vec::new());
        };

        Ok(events
            .iter()
            .filter(|event| event.id > after)
            .map(|event| (event.id.to_string(), event.message.clone()))
            .collect())
    }

    async fn cleanup(&self) -> TransportResult<usize> {
        let now = Instant::now();
        let mut removed = 0;

        for mut entry in self.streams.iter_mut() {
            let events = entry.value_mut();
            while let Some(front) = events.front() {
                if now.duration_since(front.stored_at) > self.expiration {
                    events.pop_front();
                    removed += 1;
                } else {
                    break;
                }
            }
        }

        self.streams.retain(|_, events| !events.is_empty());
        Ok(removed)
    }
}
