//! # roomnet-core
//!
//! Shared library for RoomNet containing the blob store, the bulk transfer
//! channel, the signaling message types, and the capture/persistence hooks.
//!
//! This crate is used by both the master and client applications.  It has no
//! dependencies on any game engine, rendering pipeline, or sensor SDK.
//!
//! # Architecture overview (for beginners)
//!
//! RoomNet shares a single binary blob — a captured 3D room mesh — between a
//! set of heterogeneous devices.  One device is the *master*: it owns the
//! authoritative copy of the mesh and coordinates distribution.  Every other
//! device is a *client*: it pulls the current mesh when it joins, and it can
//! push a freshly captured mesh back to the master, which then redistributes
//! it to everyone else.
//!
//! Moving the mesh takes two phases:
//!
//! 1. **Signaling** – small control messages ("send me the blob", "fetch it
//!    from 10.0.0.5:9000") travel over an existing reliable message bus with
//!    stable peer IDs.  RoomNet does not implement that bus; it consumes it
//!    through the [`signaling::SignalingChannel`] trait.
//!
//! 2. **Transfer** – the mesh bytes themselves travel over a raw TCP stream
//!    opened just for that one exchange and torn down afterwards.  See
//!    [`transfer`] for the exact (deliberately minimal) wire contract.
//!
//! The modules:
//!
//! - **`store`** – the process-wide latch holding the most recent blob plus
//!   its arrival timestamp; thread-safe get/set, polled by display code.
//!
//! - **`transfer`** – the point-to-point byte-stream primitives: listen and
//!   serve one connection, or connect and read/write until close.
//!
//! - **`peer`** – logical messaging identity ([`PeerId`]) vs physical
//!   transport address ([`PeerAddress`]) of a participant.
//!
//! - **`signaling`** – the control-message vocabulary and the trait through
//!   which the external substrate is consumed, plus an in-process loopback
//!   bus for demos and tests.
//!
//! - **`capture`** – narrow interfaces to the sensor side: produce the
//!   current mesh, persist it under a name, load it back.

pub mod capture;
pub mod peer;
pub mod signaling;
pub mod store;
pub mod transfer;

// Re-export the most-used types at the crate root so callers can write
// `roomnet_core::BlobStore` instead of `roomnet_core::store::BlobStore`.
pub use peer::{AddressParseError, PeerAddress, PeerId};
pub use signaling::{SignalEvent, SignalMessage, SignalingChannel, SignalingError};
pub use store::BlobStore;
pub use transfer::{fetch_once, push_once, BlobListener, TransferError};
