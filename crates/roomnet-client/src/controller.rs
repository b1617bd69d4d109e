//! The client role controller.
//!
//! A client only ever talks to the master.  Its three flows:
//!
//! - **Join-time pull**: [`ClientController::request_blob`] sends a directed
//!   `RequestBlob`; the master answers `BlobAvailableAt(host:port)` and the
//!   client pulls with `fetch_once`.
//! - **Unsolicited update**: a `BlobAvailableAt` that is *not* a reply to our
//!   own request (the master redistributing someone's fresh mesh) takes the
//!   identical fetch path — the client does not distinguish the two.
//! - **Push**: [`ClientController::push_blob`] stores the new capture
//!   locally, asks the master with `PushBlob`, and on the `ReceiveAt` reply
//!   delivers the bytes with `push_once`.
//!
//! Failures surface as [`ClientEvent`]s and are never retried silently; a
//! failed fetch leaves the store exactly as it was.  Each inbound message is
//! handled on its own spawned worker so a long transfer never blocks the
//! controlling thread or later events.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use roomnet_core::signaling::{SignalEvent, SignalMessage, SignalingChannel, SignalingError};
use roomnet_core::store::BlobStore;
use roomnet_core::transfer::{fetch_once, push_once, TransferError};
use roomnet_core::{PeerAddress, PeerId};

/// Capacity of the controller's outbound event channel.
const EVENT_CAPACITY: usize = 64;

/// Error type for client-side protocol operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A bulk transfer failed; the store is unchanged.
    #[error(transparent)]
    Transfer(#[from] TransferError),
    /// A control message could not be delivered to the master.
    #[error(transparent)]
    Signaling(#[from] SignalingError),
    /// The master asked us to deliver a push but the store is empty.
    #[error("received ReceiveAt but no blob is stored to push")]
    NothingToPush,
}

/// Events emitted by the controller to the hosting application.
#[derive(Debug)]
pub enum ClientEvent {
    /// A pull completed and the store now holds `bytes`.
    BlobFetched { bytes: usize },
    /// Our push was delivered to the master.
    BlobPushed { bytes: usize },
    /// The master rejected our request because it has no mesh yet.
    MasterHasNoBlob,
    /// A flow failed; the caller decides whether to retry.
    SyncFailed { error: ClientError },
}

/// The client role controller.
pub struct ClientController {
    store: Arc<BlobStore>,
    signaling: Arc<dyn SignalingChannel>,
    master: PeerId,
    events: mpsc::Sender<ClientEvent>,
}

impl ClientController {
    /// Creates the controller and returns it together with the receiver for
    /// its [`ClientEvent`]s.  `master` is the substrate identity of the one
    /// master node this client talks to.
    pub fn new(
        store: Arc<BlobStore>,
        signaling: Arc<dyn SignalingChannel>,
        master: PeerId,
    ) -> (Arc<Self>, mpsc::Receiver<ClientEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_CAPACITY);
        let controller = Arc::new(Self {
            store,
            signaling,
            master,
            events: tx,
        });
        (controller, rx)
    }

    /// The blob store this controller fills and pushes from.
    pub fn store(&self) -> &Arc<BlobStore> {
        &self.store
    }

    /// Asks the master for the current blob.  Called once on join; callers
    /// may invoke it again as their own retry policy.
    pub async fn request_blob(&self) -> Result<(), ClientError> {
        info!("requesting current blob from master {}", self.master);
        self.signaling
            .send_directed(
                self.master,
                SignalMessage::RequestBlob {
                    requester: self.signaling.local_id(),
                },
            )
            .await?;
        Ok(())
    }

    /// Stores a freshly captured blob locally and offers it to the master.
    ///
    /// The actual delivery happens when the master replies `ReceiveAt`.
    pub async fn push_blob(&self, payload: Vec<u8>) -> Result<(), ClientError> {
        info!("offering a {} byte capture to the master", payload.len());
        self.store.set(payload);
        self.signaling
            .send_directed(
                self.master,
                SignalMessage::PushBlob {
                    requester: self.signaling.local_id(),
                },
            )
            .await?;
        Ok(())
    }

    /// Consumes inbound signaling events until the channel closes.
    ///
    /// Run on a task: `tokio::spawn(controller.clone().run(rx))`.
    pub async fn run(self: Arc<Self>, mut inbound: mpsc::Receiver<SignalEvent>) {
        info!("client controller running as {}", self.signaling.local_id());
        while let Some(event) = inbound.recv().await {
            let controller = Arc::clone(&self);
            tokio::spawn(async move { controller.dispatch(event).await });
        }
        info!("signaling channel closed; client controller stopping");
    }

    async fn dispatch(self: Arc<Self>, event: SignalEvent) {
        // Transfer addresses steer this client to open sockets; only the one
        // configured master may do that.
        if event.from != self.master {
            debug!(
                "ignoring {:?} from non-master peer {}",
                event.message.kind(),
                event.from
            );
            return;
        }
        let result = match event.message {
            SignalMessage::BlobAvailableAt(addr) => self.fetch_and_store(addr).await,
            SignalMessage::ReceiveAt(addr) => self.deliver_push(addr).await,
            SignalMessage::BlobUnavailable => {
                info!("master has no blob to serve yet");
                let _ = self.events.send(ClientEvent::MasterHasNoBlob).await;
                Ok(())
            }
            other => {
                debug!(
                    "ignoring master-bound {:?} from {}",
                    other.kind(),
                    event.from
                );
                Ok(())
            }
        };
        if let Err(error) = result {
            warn!("client flow failed: {error}");
            let _ = self.events.send(ClientEvent::SyncFailed { error }).await;
        }
    }

    /// Pulls the blob from `addr` and stores it.  On failure the store is
    /// left untouched — no partial overwrite, no silent retry.
    async fn fetch_and_store(&self, addr: PeerAddress) -> Result<(), ClientError> {
        let payload = fetch_once(&addr).await?;
        let bytes = payload.len();
        self.store.set(payload);
        info!("fetched {bytes} bytes from {addr}");
        let _ = self.events.send(ClientEvent::BlobFetched { bytes }).await;
        Ok(())
    }

    /// Delivers our stored blob to the master's receiving listener.
    async fn deliver_push(&self, addr: PeerAddress) -> Result<(), ClientError> {
        let blob = self.store.get().ok_or(ClientError::NothingToPush)?;
        let bytes = push_once(&addr, &blob).await?;
        info!("pushed {bytes} bytes to {addr}");
        let _ = self.events.send(ClientEvent::BlobPushed { bytes }).await;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
//
// End-to-end flows against a live master run in the master crate's
// `tests/distribution_integration.rs`; here we cover the client-local paths
// over the loopback bus alone.
