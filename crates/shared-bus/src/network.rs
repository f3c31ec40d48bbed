//! # In-Memory Peer Transport
//!
//! Point-to-point messaging between the oracles of one local committee.
//! The sender identity of every delivered message is set by the network,
//! never by the payload, which models an authenticated transport.
//!
//! Delivery is best effort:
//!
//! - each peer has a bounded mailbox; sends to a full mailbox are dropped
//! - an offline peer neither sends nor receives
//! - messages from one sender to one recipient stay in order

use parking_lot::RwLock;
use shared_types::OracleId;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::trace;

/// Outbound message port used by the protocol.
///
/// Both calls are non-blocking and lossy; the protocol tolerates drops.
pub trait PeerTransport: Send + Sync {
    /// Send `bytes` to one peer.
    fn send(&self, to: OracleId, bytes: Vec<u8>);

    /// Send `bytes` to every peer, including the sender itself.
    fn broadcast(&self, bytes: Vec<u8>);
}

/// A message as seen by the recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub from: OracleId,
    pub bytes: Vec<u8>,
}

struct Mailbox {
    sender: mpsc::Sender<InboundMessage>,
    online: bool,
}

struct NetworkState {
    mailboxes: RwLock<BTreeMap<OracleId, Mailbox>>,
    capacity: usize,
    delivered: AtomicU64,
    dropped: AtomicU64,
}

impl NetworkState {
    fn is_online(&self, id: OracleId) -> bool {
        self.mailboxes.read().get(&id).is_some_and(|m| m.online)
    }

    fn deliver(&self, from: OracleId, to: OracleId, bytes: Vec<u8>) {
        let mailboxes = self.mailboxes.read();
        let delivered = match mailboxes.get(&to) {
            Some(mailbox) if mailbox.online => mailbox
                .sender
                .try_send(InboundMessage { from, bytes })
                .is_ok(),
            _ => false,
        };

        if delivered {
            self.delivered.fetch_add(1, Ordering::Relaxed);
        } else {
            trace!(%from, %to, "message dropped");
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Shared in-process network.
#[derive(Clone)]
pub struct InMemoryNetwork {
    state: Arc<NetworkState>,
}

impl InMemoryNetwork {
    /// Create a network whose mailboxes hold `capacity` messages each.
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Arc::new(NetworkState {
                mailboxes: RwLock::new(BTreeMap::new()),
                capacity: capacity.max(1),
                delivered: AtomicU64::new(0),
                dropped: AtomicU64::new(0),
            }),
        }
    }

    /// Attach `id`, replacing any previous mailbox for it.
    ///
    /// Returns the endpoint to send through and the inbound mailbox.
    pub fn join(&self, id: OracleId) -> (NetworkEndpoint, mpsc::Receiver<InboundMessage>) {
        let (sender, receiver) = mpsc::channel(self.state.capacity);
        self.state.mailboxes.write().insert(
            id,
            Mailbox {
                sender,
                online: true,
            },
        );
        let endpoint = NetworkEndpoint {
            id,
            state: Arc::clone(&self.state),
        };
        (endpoint, receiver)
    }

    /// Take a peer off the network or bring it back.
    pub fn set_online(&self, id: OracleId, online: bool) {
        if let Some(mailbox) = self.state.mailboxes.write().get_mut(&id) {
            mailbox.online = online;
        }
    }

    pub fn is_online(&self, id: OracleId) -> bool {
        self.state.is_online(id)
    }

    pub fn peers(&self) -> Vec<OracleId> {
        self.state.mailboxes.read().keys().copied().collect()
    }

    pub fn messages_delivered(&self) -> u64 {
        self.state.delivered.load(Ordering::Relaxed)
    }

    pub fn messages_dropped(&self) -> u64 {
        self.state.dropped.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryNetwork {
    fn default() -> Self {
        Self::new(crate::DEFAULT_MAILBOX_CAPACITY)
    }
}

/// One peer's sending side.
#[derive(Clone)]
pub struct NetworkEndpoint {
    id: OracleId,
    state: Arc<NetworkState>,
}

impl NetworkEndpoint {
    pub fn id(&self) -> OracleId {
        self.id
    }
}

impl PeerTransport for NetworkEndpoint {
    fn send(&self, to: OracleId, bytes: Vec<u8>) {
        if !self.state.is_online(self.id) {
            self.state.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.state.deliver(self.id, to, bytes);
    }

    fn broadcast(&self, bytes: Vec<u8>) {
        if !self.state.is_online(self.id) {
            self.state.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        }
        let peers: Vec<OracleId> = self.state.mailboxes.read().keys().copied().collect();
        for to in peers {
            self.state.deliver(self.id, to, bytes.clone());
        }
    }
}
