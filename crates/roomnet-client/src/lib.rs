//! roomnet-client library entry point.
//!
//! Every non-master device in a RoomNet deployment runs the *client* role:
//! it asks the master for the current room mesh the moment it joins, pulls
//! updates whenever the master announces one, and — on devices that can scan
//! (the headset in the original deployment) — pushes a freshly captured mesh
//! back to the master for everyone else.
//!
//! The role is fixed at startup: a node constructs exactly one
//! [`ClientController`] (or one master controller, never both) and drives it
//! with the inbound signaling events.  Display code does not hook into the
//! controller at all; it polls the shared `BlobStore` through a
//! [`watch::BlobWatcher`] once per frame, which is the package's only
//! change-notification mechanism.

pub mod controller;
pub mod watch;

pub use controller::{ClientController, ClientError, ClientEvent};
pub use watch::BlobWatcher;
