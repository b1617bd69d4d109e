//! The master role controller: signaling handlers plus transfer workers.
//!
//! # Control flow
//!
//! ```text
//! Client                                Master
//! ──────                                ──────
//! RequestBlob(me) ────────────────────▶ bind one-shot listener
//!                 ◀─ BlobAvailableAt ── (bound *before* the advertise)
//! fetch_once ──────────TCP───────────▶ serve_once(current blob)
//!
//! PushBlob(me) ───────────────────────▶ bind receiving listener
//!                 ◀─── ReceiveAt ─────
//! push_once ───────────TCP───────────▶ receive_once → store
//!                                       BlobAvailableAt ─▶ every other client
//! ```
//!
//! Every inbound signaling event is handled on its own spawned task, so two
//! clients requesting at once each get their own listener on their own
//! ephemeral port — neither waits behind the other.  The only state the
//! workers share is the `BlobStore`.
//!
//! Listen-then-announce is load-bearing: a handler always binds its listener
//! and reads the real port back *before* the address string is put on the
//! signaling channel.  The substrate's per-sender ordering does the rest.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use roomnet_core::peer::AddressParseError;
use roomnet_core::signaling::{SignalEvent, SignalMessage, SignalingChannel, SignalingError};
use roomnet_core::store::BlobStore;
use roomnet_core::transfer::{BlobListener, TransferError};
use roomnet_core::{PeerAddress, PeerId};

use crate::config::MasterConfig;

/// Capacity of the controller's outbound event channel.
const EVENT_CAPACITY: usize = 64;

/// Error type for master-side protocol operations.
#[derive(Debug, Error)]
pub enum MasterError {
    /// A bulk transfer failed; the store is unchanged.
    #[error(transparent)]
    Transfer(#[from] TransferError),
    /// A control message could not be delivered.
    #[error(transparent)]
    Signaling(#[from] SignalingError),
    /// The configured advertise host does not form a valid address.
    #[error("bad advertise address: {0}")]
    Address(#[from] AddressParseError),
    /// A client asked for the blob before any mesh exists.  Reported back to
    /// the requester as `BlobUnavailable`, never served as zero bytes.
    #[error("no blob stored yet")]
    EmptyBlob,
}

/// Events emitted by the controller to the hosting application.
#[derive(Debug)]
pub enum MasterEvent {
    /// A client's pull completed; `bytes` went out.
    BlobServed { to: PeerId, bytes: usize },
    /// A client's push completed; `bytes` are now the stored blob.
    BlobReceived { from: PeerId, bytes: usize },
    /// An update fan-out finished: every notified peer pulled its copy.
    Redistributed { recipients: usize, bytes: usize },
    /// A handler for one peer's message failed (including the
    /// [`MasterError::EmptyBlob`] rejection path).
    HandlerFailed { peer: PeerId, error: MasterError },
    /// The update fan-out died part-way; some peers may not have the blob.
    RedistributeFailed { error: TransferError },
}

/// The master role controller.
///
/// Construct once at startup (the role never changes at runtime), then
/// drive it with [`MasterController::run`] on the inbound signaling events.
pub struct MasterController {
    config: MasterConfig,
    store: Arc<BlobStore>,
    signaling: Arc<dyn SignalingChannel>,
    events: mpsc::Sender<MasterEvent>,
}

impl MasterController {
    /// Creates the controller and returns it together with the receiver for
    /// its [`MasterEvent`]s.
    ///
    /// # Errors
    ///
    /// [`MasterError::Address`] when `config.advertise_host` is not a valid
    /// colon-free host — caught here rather than on the first serve.
    pub fn new(
        config: MasterConfig,
        store: Arc<BlobStore>,
        signaling: Arc<dyn SignalingChannel>,
    ) -> Result<(Arc<Self>, mpsc::Receiver<MasterEvent>), MasterError> {
        // Fail fast on a host that could never format into a payload.
        PeerAddress::new(config.advertise_host.clone(), 0)?;
        let (tx, rx) = mpsc::channel(EVENT_CAPACITY);
        let controller = Arc::new(Self {
            config,
            store,
            signaling,
            events: tx,
        });
        Ok((controller, rx))
    }

    /// The blob store this controller serves from and stores into.
    pub fn store(&self) -> &Arc<BlobStore> {
        &self.store
    }

    /// Consumes inbound signaling events until the channel closes.
    ///
    /// Each event is dispatched on its own spawned worker so concurrent
    /// requesters never serialize behind one transfer.  Run this on a task:
    /// `tokio::spawn(controller.clone().run(rx))`; it ends when the
    /// substrate connection is gone.
    pub async fn run(self: Arc<Self>, mut inbound: mpsc::Receiver<SignalEvent>) {
        info!("master controller running as {}", self.signaling.local_id());
        while let Some(event) = inbound.recv().await {
            let controller = Arc::clone(&self);
            tokio::spawn(async move { controller.dispatch(event).await });
        }
        info!("signaling channel closed; master controller stopping");
    }

    async fn dispatch(self: Arc<Self>, event: SignalEvent) {
        let peer = event.from;
        let result = match event.message {
            SignalMessage::RequestBlob { requester } => self.handle_request(requester).await,
            SignalMessage::PushBlob { requester } => self.handle_push(requester).await,
            other => {
                // Master-bound traffic only; replies addressed to clients
                // can only reach us through a confused substrate.
                debug!("ignoring client-bound {:?} from {peer}", other.kind());
                Ok(())
            }
        };
        if let Err(error) = result {
            warn!("handler for {peer} failed: {error}");
            let _ = self
                .events
                .send(MasterEvent::HandlerFailed { peer, error })
                .await;
        }
    }

    /// Serves the current blob to one requester over a one-shot listener.
    async fn handle_request(&self, requester: PeerId) -> Result<(), MasterError> {
        let Some(blob) = self.store.get() else {
            info!("no blob to serve yet; rejecting request from {requester}");
            self.signaling
                .send_directed(requester, SignalMessage::BlobUnavailable)
                .await?;
            return Err(MasterError::EmptyBlob);
        };

        let listener = self.bind_listener().await?;
        let addr = self.advertised(&listener)?;
        info!("serving {} bytes to {requester} at {addr}", blob.len());
        self.signaling
            .send_directed(requester, SignalMessage::BlobAvailableAt(addr))
            .await?;

        let bytes = listener.serve_once(&blob).await?;
        let _ = self
            .events
            .send(MasterEvent::BlobServed {
                to: requester,
                bytes,
            })
            .await;
        Ok(())
    }

    /// Takes delivery of a client's push, stores it, and fans the update out
    /// to every other connected client.
    async fn handle_push(&self, requester: PeerId) -> Result<(), MasterError> {
        let listener = self.bind_listener().await?;
        let addr = self.advertised(&listener)?;
        info!("taking a push from {requester} at {addr}");
        self.signaling
            .send_directed(requester, SignalMessage::ReceiveAt(addr))
            .await?;

        let payload = listener.receive_once().await?;
        let bytes = payload.len();
        self.store.set(payload);
        info!("stored {bytes} bytes pushed by {requester}");
        let _ = self
            .events
            .send(MasterEvent::BlobReceived {
                from: requester,
                bytes,
            })
            .await;

        // The pusher already has this blob; everyone else pulls it.
        self.redistribute(Some(requester)).await
    }

    /// Stores a locally produced blob and fans it out to all peers.
    ///
    /// This is the "freshly captured (or archive-loaded) mesh on the master
    /// itself" trigger.  Returns once the update has been advertised; the
    /// transfers themselves complete on a background worker and report via
    /// [`MasterEvent::Redistributed`].
    pub async fn publish(&self, payload: Vec<u8>) -> Result<(), MasterError> {
        self.store.set(payload);
        self.redistribute(None).await
    }

    /// Advertises the current blob to every connected peer except `exclude`
    /// and serves one transfer connection per notified peer.
    async fn redistribute(&self, exclude: Option<PeerId>) -> Result<(), MasterError> {
        let recipients: Vec<PeerId> = self
            .signaling
            .peers()
            .into_iter()
            .filter(|id| Some(*id) != exclude)
            .collect();
        if recipients.is_empty() {
            debug!("no peers to redistribute to");
            return Ok(());
        }
        let blob = self.store.get().ok_or(MasterError::EmptyBlob)?;

        let listener = self.bind_listener().await?;
        let addr = self.advertised(&listener)?;
        info!(
            "redistributing {} bytes to {} peer(s) at {addr}",
            blob.len(),
            recipients.len()
        );

        // Notify first and count who actually heard.  The fan-out worker
        // must expect exactly as many pulls as notifications delivered; a
        // peer that departed between the membership snapshot and the send is
        // skipped and left out of the count, so the worker can always drain
        // to completion.  The listener is already bound, so a fast peer that
        // connects before the worker starts just queues in the backlog.
        let mut notified = 0usize;
        let mut substrate_lost = None;
        match exclude {
            Some(_) => {
                for id in &recipients {
                    match self
                        .signaling
                        .send_directed(*id, SignalMessage::BlobAvailableAt(addr.clone()))
                        .await
                    {
                        Ok(()) => notified += 1,
                        Err(SignalingError::UnknownPeer(peer)) => {
                            warn!("skipping departed peer {peer} during redistribution");
                        }
                        Err(error) => {
                            substrate_lost = Some(error);
                            break;
                        }
                    }
                }
            }
            None => {
                notified = self
                    .signaling
                    .broadcast(SignalMessage::BlobAvailableAt(addr))
                    .await?;
            }
        }

        // Fan-out worker: exactly one accept per *notified* peer, each pull
        // written on the shared listener.  Spawned so the handler (and the
        // publish caller) is not parked behind the slowest client.
        if notified > 0 {
            let events = self.events.clone();
            tokio::spawn(async move {
                for served in 0..notified {
                    if let Err(error) = listener.serve_next(&blob).await {
                        warn!(
                            "redistribution stopped after {served} of {notified} transfers: {error}"
                        );
                        let _ = events.send(MasterEvent::RedistributeFailed { error }).await;
                        return;
                    }
                }
                let _ = events
                    .send(MasterEvent::Redistributed {
                        recipients: notified,
                        bytes: blob.len(),
                    })
                    .await;
            });
        }

        match substrate_lost {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }

    async fn bind_listener(&self) -> Result<BlobListener, MasterError> {
        Ok(BlobListener::bind(self.config.bind_address, self.config.transfer_port).await?)
    }

    fn advertised(&self, listener: &BlobListener) -> Result<PeerAddress, MasterError> {
        Ok(PeerAddress::new(
            self.config.advertise_host.clone(),
            listener.local_addr().port(),
        )?)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
//
// Full protocol coverage (scenarios with live clients over real sockets)
// lives in `tests/distribution_integration.rs`; these unit tests pin down
// construction-time validation.

#[cfg(test)]
mod tests {
    use super::*;
    use roomnet_core::signaling::LoopbackBus;

    #[test]
    fn test_new_rejects_a_colon_bearing_advertise_host() {
        let bus = LoopbackBus::new();
        let (peer, _rx) = bus.join();
        let config = MasterConfig {
            advertise_host: "fe80::1".to_string(),
            ..MasterConfig::default()
        };
        let result = MasterController::new(config, Arc::new(BlobStore::new()), peer);
        assert!(matches!(result, Err(MasterError::Address(_))));
    }

    #[test]
    fn test_new_accepts_the_default_config() {
        let bus = LoopbackBus::new();
        let (peer, _rx) = bus.join();
        let result =
            MasterController::new(MasterConfig::default(), Arc::new(BlobStore::new()), peer);
        assert!(result.is_ok());
    }
}
