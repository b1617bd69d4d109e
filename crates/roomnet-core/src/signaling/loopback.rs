//! In-process reference implementation of the signaling substrate.
//!
//! `LoopbackBus` routes [`SignalEvent`]s between participants living in the
//! same process over per-peer `mpsc` channels.  It exists for two reasons:
//!
//! 1. The demo binary needs *some* substrate, and a real room service is out
//!    of scope for this package.
//! 2. Integration tests exercise the full master/client protocol (including
//!    the real TCP transfers) without any external infrastructure.
//!
//! It honours the substrate contract the role controllers rely on: stable
//! per-connection [`PeerId`]s, reliable delivery, ordering per sender, and
//! broadcast-to-others semantics.  A participant leaves the bus when its
//! [`LoopbackPeer`] handle is dropped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use crate::peer::PeerId;
use crate::signaling::{SignalEvent, SignalMessage, SignalingChannel, SignalingError};

/// Capacity of each participant's inbound event channel.
const INBOX_CAPACITY: usize = 64;

/// The shared router: a registry mapping each joined peer to its inbox.
#[derive(Debug, Default)]
pub struct LoopbackBus {
    inboxes: Mutex<HashMap<PeerId, mpsc::Sender<SignalEvent>>>,
}

impl LoopbackBus {
    /// Creates an empty bus.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Joins the bus as a new participant.
    ///
    /// Returns the participant's channel handle (its [`SignalingChannel`]
    /// implementation) and the receiver on which its inbound events arrive.
    /// The assigned [`PeerId`] is fresh per join, mirroring how a real
    /// substrate assigns IDs per connection.
    pub fn join(self: &Arc<Self>) -> (Arc<LoopbackPeer>, mpsc::Receiver<SignalEvent>) {
        let id = PeerId::generate();
        let (tx, rx) = mpsc::channel(INBOX_CAPACITY);
        self.inboxes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, tx);
        debug!("peer {id} joined the loopback bus");
        let peer = Arc::new(LoopbackPeer {
            id,
            bus: Arc::clone(self),
        });
        (peer, rx)
    }

    fn inbox_of(&self, id: PeerId) -> Option<mpsc::Sender<SignalEvent>> {
        self.inboxes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&id)
            .cloned()
    }

    fn remove(&self, id: PeerId) {
        self.inboxes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id);
        debug!("peer {id} left the loopback bus");
    }

    fn members(&self) -> Vec<PeerId> {
        self.inboxes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .copied()
            .collect()
    }
}

/// One participant's handle onto the [`LoopbackBus`].
///
/// Dropping the last clone of this handle removes the participant from the
/// bus, so `peers()` on the remaining participants stays accurate.
#[derive(Debug)]
pub struct LoopbackPeer {
    id: PeerId,
    bus: Arc<LoopbackBus>,
}

impl Drop for LoopbackPeer {
    fn drop(&mut self) {
        self.bus.remove(self.id);
    }
}

#[async_trait]
impl SignalingChannel for LoopbackPeer {
    fn local_id(&self) -> PeerId {
        self.id
    }

    fn peers(&self) -> Vec<PeerId> {
        self.bus
            .members()
            .into_iter()
            .filter(|&id| id != self.id)
            .collect()
    }

    async fn send_directed(
        &self,
        to: PeerId,
        message: SignalMessage,
    ) -> Result<(), SignalingError> {
        // Clone the sender out of the registry first so the lock is not held
        // across the await below.
        let inbox = self
            .bus
            .inbox_of(to)
            .ok_or(SignalingError::UnknownPeer(to))?;
        inbox
            .send(SignalEvent {
                from: self.id,
                message,
            })
            .await
            .map_err(|_| SignalingError::UnknownPeer(to))
    }

    async fn broadcast(&self, message: SignalMessage) -> Result<usize, SignalingError> {
        let mut delivered = 0;
        for id in self.peers() {
            // A peer racing its own departure is not a broadcast failure;
            // skip it the way a real substrate would, and leave it out of
            // the delivered count.
            match self.send_directed(id, message.clone()).await {
                Ok(()) => delivered += 1,
                Err(e) => debug!("broadcast skipped departed peer {id}: {e}"),
            }
        }
        Ok(delivered)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
