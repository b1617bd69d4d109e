//! Participant identity and addressing.
//!
//! Two different notions of "who is that node" coexist and must not be
//! confused:
//!
//! - [`PeerId`] is the *logical* messaging identity: an opaque, stable ID
//!   assigned by the signaling substrate when a participant connects.  It is
//!   only meaningful while that participant is connected and is never
//!   persisted.
//!
//! - [`PeerAddress`] is the *physical* transport address: the host and port
//!   where a node has opened (or will open) a bulk-transfer listener.  It is
//!   carried inside signaling payloads as a single `"host:port"` string.
//!
//! The address string uses a literal colon as its only delimiter, so the
//! host part must not itself contain one — IPv4 literals or plain resolvable
//! hostnames only.  [`PeerAddress::new`] and the `FromStr` impl both enforce
//! this.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ── PeerId ────────────────────────────────────────────────────────────────────

/// Opaque stable identifier for a signaling participant.
///
/// Assigned by the substrate (see `LoopbackBus` for the reference
/// implementation); valid only for the lifetime of that participant's
/// signaling connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerId(Uuid);

impl PeerId {
    /// Generates a fresh random identifier.  Called by the substrate when a
    /// participant joins, never by application code.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for PeerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ── PeerAddress ───────────────────────────────────────────────────────────────

/// Error type for `"host:port"` address parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressParseError {
    /// The string had no colon separating host and port.
    #[error("address {0:?} is missing the ':' delimiter")]
    MissingDelimiter(String),
    /// The host part was empty or contained the reserved colon delimiter.
    #[error("invalid host {0:?}: must be a colon-free IPv4 literal or hostname")]
    InvalidHost(String),
    /// The port part was not a valid 16-bit number.
    #[error("invalid port {0:?}")]
    InvalidPort(String),
}

/// A `(host, port)` pair identifying a bulk-transfer endpoint.
///
/// Formats as `"host:port"` — the exact string carried in signaling
/// payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerAddress {
    host: String,
    port: u16,
}

impl PeerAddress {
    /// Creates an address, validating that the host does not contain the
    /// colon delimiter and is non-empty.
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self, AddressParseError> {
        let host = host.into();
        if host.is_empty() || host.contains(':') {
            return Err(AddressParseError::InvalidHost(host));
        }
        Ok(Self { host, port })
    }

    /// The host part: an IPv4 literal or a resolvable hostname.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The TCP port part.
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for PeerAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .split_once(':')
            .ok_or_else(|| AddressParseError::MissingDelimiter(s.to_string()))?;
        let port = port
            .parse::<u16>()
            .map_err(|_| AddressParseError::InvalidPort(port.to_string()))?;
        Self::new(host, port)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
