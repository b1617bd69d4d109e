//! The control-message vocabulary exchanged over the signaling substrate.
//!
//! Signaling messages are tiny: they never carry mesh bytes, only *who*
//! wants the blob and *where* to move it.  The substrate's native surface is
//! `SendDirected(peerID, messageType, payload: string)`, so every message
//! maps to a `(`[`SignalKind`]`, String)` pair on the wire and back.
//!
//! The five messages, in protocol order:
//!
//! ```text
//! Client                              Master
//! ──────                              ──────
//! RequestBlob(requester) ──────────▶
//!                        ◀────────── BlobAvailableAt(host:port)   (has blob)
//!                        ◀────────── BlobUnavailable              (no blob yet)
//! fetch_once(host:port)  ──TCP────▶
//!
//! PushBlob(requester)    ──────────▶
//!                        ◀────────── ReceiveAt(host:port)
//! push_once(host:port)   ──TCP────▶
//!                                    BlobAvailableAt ──▶ all other clients
//! ```

use std::str::FromStr;

use thiserror::Error;

use crate::peer::{AddressParseError, PeerAddress, PeerId};

/// Wire discriminant for a [`SignalMessage`], matching the substrate's
/// `messageType` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SignalKind {
    RequestBlob = 0x01,
    BlobAvailableAt = 0x02,
    PushBlob = 0x03,
    ReceiveAt = 0x04,
    BlobUnavailable = 0x05,
}

impl TryFrom<u8> for SignalKind {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(SignalKind::RequestBlob),
            0x02 => Ok(SignalKind::BlobAvailableAt),
            0x03 => Ok(SignalKind::PushBlob),
            0x04 => Ok(SignalKind::ReceiveAt),
            0x05 => Ok(SignalKind::BlobUnavailable),
            _ => Err(()),
        }
    }
}

/// Error type for decoding a `(kind, payload)` pair off the substrate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessageError {
    /// The message type byte is not part of the vocabulary.
    #[error("unknown signal message type 0x{0:02x}")]
    UnknownKind(u8),
    /// The payload should have been a `"host:port"` address but was not.
    #[error("bad address payload: {0}")]
    BadAddress(#[from] AddressParseError),
    /// The payload should have been a peer ID but was not.
    #[error("bad peer-id payload {0:?}")]
    BadPeerId(String),
}

/// A control message, already decoded into its typed form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalMessage {
    /// "Send me the current blob."  Carries the requester's own ID, matching
    /// the substrate convention that the payload names the interested party
    /// even though dispatch also reports the sender.
    RequestBlob { requester: PeerId },
    /// "The blob can be pulled from this address."  Sent as a directed reply
    /// to a request, or unsolicited after an update; clients treat both
    /// identically.
    BlobAvailableAt(PeerAddress),
    /// "I have a fresh blob to deliver; tell me where to send it."
    PushBlob { requester: PeerId },
    /// "I am listening at this address; connect and write your blob."
    ReceiveAt(PeerAddress),
    /// "There is no blob to serve yet."  The no-op failure reply to a
    /// request that arrived before any mesh existed; never answered with a
    /// zero-byte transfer instead.
    BlobUnavailable,
}

impl SignalMessage {
    /// Returns the wire discriminant for this message.
    pub fn kind(&self) -> SignalKind {
        match self {
            SignalMessage::RequestBlob { .. } => SignalKind::RequestBlob,
            SignalMessage::BlobAvailableAt(_) => SignalKind::BlobAvailableAt,
            SignalMessage::PushBlob { .. } => SignalKind::PushBlob,
            SignalMessage::ReceiveAt(_) => SignalKind::ReceiveAt,
            SignalMessage::BlobUnavailable => SignalKind::BlobUnavailable,
        }
    }

    /// Encodes the payload half of the wire pair.
    pub fn payload(&self) -> String {
        match self {
            SignalMessage::RequestBlob { requester } => requester.to_string(),
            SignalMessage::PushBlob { requester } => requester.to_string(),
            SignalMessage::BlobAvailableAt(addr) => addr.to_string(),
            SignalMessage::ReceiveAt(addr) => addr.to_string(),
            SignalMessage::BlobUnavailable => String::new(),
        }
    }

    /// Decodes a `(kind, payload)` pair received from the substrate.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError`] when the payload does not parse as the form
    /// the kind requires.
    pub fn from_wire(kind: SignalKind, payload: &str) -> Result<Self, MessageError> {
        match kind {
            SignalKind::RequestBlob => Ok(SignalMessage::RequestBlob {
                requester: parse_peer_id(payload)?,
            }),
            SignalKind::PushBlob => Ok(SignalMessage::PushBlob {
                requester: parse_peer_id(payload)?,
            }),
            SignalKind::BlobAvailableAt => {
                Ok(SignalMessage::BlobAvailableAt(payload.parse()?))
            }
            SignalKind::ReceiveAt => Ok(SignalMessage::ReceiveAt(payload.parse()?)),
            SignalKind::BlobUnavailable => Ok(SignalMessage::BlobUnavailable),
        }
    }
}

fn parse_peer_id(payload: &str) -> Result<PeerId, MessageError> {
    PeerId::from_str(payload).map_err(|_| MessageError::BadPeerId(payload.to_string()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
