//! # Shared Bus
//!
//! In-process plumbing shared by every subsystem of the oracle node.
//!
//! ## Telemetry
//!
//! Protocol components report round, epoch and transmission events through
//! the [`TelemetrySink`] port. Emitting is synchronous, never blocks and
//! cannot fail from the caller's perspective.
//!
//! ```text
//! ┌──────────────┐  emit()   ┌──────────────┐  subscribe()  ┌──────────────┐
//! │  Pacemaker   │ ────────▶ │  Event Bus   │ ────────────▶ │  Forwarder   │
//! │  Scheduler   │           │ (broadcast)  │               │ (metrics,    │
//! └──────────────┘           └──────────────┘               │  logs)       │
//!                                                           └──────────────┘
//! ```
//!
//! Slow subscribers lag and lose events; the publisher is never held up.
//!
//! ## Transport
//!
//! [`PeerTransport`] is the point-to-point message port the protocol sends
//! through. [`InMemoryNetwork`] implements it for the local devnet and the
//! scenario tests: authenticated by construction, ordered per sender, lossy
//! when a mailbox is full or a peer is offline.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod network;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{EventFilter, EventTopic, OracleEvent};
pub use network::{InMemoryNetwork, InboundMessage, NetworkEndpoint, PeerTransport};
pub use publisher::{InMemoryEventBus, NoopSink, TelemetrySink};
pub use subscriber::{Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before it starts lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Default per-peer inbound mailbox size for the in-memory network.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 256;
