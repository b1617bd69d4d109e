//! roomnet-master library entry point.
//!
//! # What does the master do? (for beginners)
//!
//! Exactly one node in a RoomNet deployment runs the *master* role, fixed at
//! startup for the node's whole lifetime.  The master owns the authoritative
//! copy of the room mesh and coordinates every movement of it:
//!
//! 1. A client that just joined asks for the current mesh; the master opens
//!    a one-shot TCP listener, tells the client where it is, and serves the
//!    bytes.
//! 2. A client with a freshly scanned mesh asks to deliver it; the master
//!    opens a receiving listener, takes the bytes, stores them, and then
//!    notifies every *other* client that an update is available to pull.
//! 3. The application on the master itself can publish a mesh (for example
//!    one loaded from the on-disk archive), which follows the same
//!    notify-and-serve fan-out.
//!
//! Each of these runs on its own spawned worker, so several clients can be
//! served at once without one slow transfer stalling another's handshake.

pub mod config;
pub mod controller;

pub use config::MasterConfig;
pub use controller::{MasterController, MasterError, MasterEvent};
