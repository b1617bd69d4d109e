//! The signaling seam: how RoomNet talks to its control-message substrate.
//!
//! RoomNet does not implement group membership, room joining, or message
//! routing itself — an existing reliable, ordered, at-least-once bus with
//! stable peer IDs provides all of that (in the original deployment, a
//! Photon-style room; in tests and demos, the in-process [`LoopbackBus`]).
//! This module defines the narrow trait the role controllers consume:
//!
//! - outbound: [`SignalingChannel::send_directed`] to one peer, or
//!   [`SignalingChannel::broadcast`] to every *other* peer;
//! - inbound: an `mpsc` receiver of [`SignalEvent`]s, one per delivered
//!   message, carrying the sender's [`PeerId`].
//!
//! Ordering is guaranteed per sender, which the protocol leans on: a node
//! advertising a transfer address has always bound its listener before the
//! advertisement could possibly arrive.

pub mod loopback;
pub mod messages;

use async_trait::async_trait;
use thiserror::Error;

use crate::peer::PeerId;

pub use loopback::{LoopbackBus, LoopbackPeer};
pub use messages::{MessageError, SignalKind, SignalMessage};

/// Error type for signaling-level failures.
///
/// These are terminal for the operation in hand: the core never retries a
/// failed delivery on its own.
#[derive(Debug, Error)]
pub enum SignalingError {
    /// The destination peer ID is not (or no longer) connected.
    #[error("peer {0} is unknown to the signaling substrate")]
    UnknownPeer(PeerId),
    /// The substrate connection is gone; participation has ended.
    #[error("signaling substrate disconnected")]
    Disconnected,
}

/// An inbound control message, as dispatched to a role controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalEvent {
    /// The substrate-assigned identity of the sender.
    pub from: PeerId,
    /// The decoded message.
    pub message: SignalMessage,
}

/// The consumed surface of the external signaling substrate.
///
/// One implementation per substrate; controllers hold it as
/// `Arc<dyn SignalingChannel>` and never see past the trait.
#[async_trait]
pub trait SignalingChannel: Send + Sync {
    /// This node's own substrate-assigned identity.
    fn local_id(&self) -> PeerId;

    /// All *other* currently connected participants.
    ///
    /// The master uses this for fan-out accounting: when it redistributes an
    /// updated blob it must accept exactly one transfer connection per
    /// notified peer.
    fn peers(&self) -> Vec<PeerId>;

    /// Delivers `message` to exactly one peer.
    ///
    /// # Errors
    ///
    /// [`SignalingError::UnknownPeer`] if `to` is not connected;
    /// [`SignalingError::Disconnected`] if this node itself has lost the
    /// substrate.
    async fn send_directed(&self, to: PeerId, message: SignalMessage)
        -> Result<(), SignalingError>;

    /// Delivers `message` to every connected peer except this node.
    ///
    /// Returns the number of peers the message was actually delivered to —
    /// peers that departed between the membership snapshot and the send are
    /// skipped, not counted.  The master's fan-out relies on this count
    /// matching the number of pulls to expect.
    async fn broadcast(&self, message: SignalMessage) -> Result<usize, SignalingError>;
}
