//! # Event Publisher
//!
//! The publishing side of the event bus and the [`TelemetrySink`] port.

use crate::events::{EventFilter, OracleEvent};
use crate::subscriber::Subscription;
use crate::DEFAULT_CHANNEL_CAPACITY;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Fire-and-forget receiver of protocol events.
///
/// Implementations must return promptly and must not fail; the protocol
/// never waits on telemetry.
pub trait TelemetrySink: Send + Sync {
    fn emit(&self, event: OracleEvent);
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl TelemetrySink for NoopSink {
    fn emit(&self, _event: OracleEvent) {}
}

/// Broadcast bus shared by every oracle of a process.
///
/// A subscriber that falls more than `capacity` events behind loses the
/// oldest ones; `emit` never waits.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<OracleEvent>,
    events_published: AtomicU64,
    capacity: usize,
}

impl InMemoryEventBus {
    /// Create a new in-memory event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new in-memory event bus with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            events_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Subscribe to events matching a filter.
    ///
    /// Only events emitted after this call are received.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        debug!(topics = ?filter.topics, oracles = ?filter.oracles, "subscribed");
        Subscription::new(self.sender.subscribe(), filter)
    }

    /// Get the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get the total number of events emitted.
    #[must_use]
    pub fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetrySink for InMemoryEventBus {
    fn emit(&self, event: OracleEvent) {
        let oracle = event.oracle();
        let kind = event.kind();
        self.events_published.fetch_add(1, Ordering::Relaxed);

        match self.sender.send(event) {
            Ok(receivers) => trace!(%oracle, kind, receivers, "event published"),
            Err(_) => trace!(%oracle, kind, "event dropped, no subscribers"),
        }
    }
}
