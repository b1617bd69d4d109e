//! RoomNet demo entry point.
//!
//! Runs the whole protocol inside one process: a master and two clients
//! joined to the in-process loopback signaling bus, with every mesh byte
//! still crossing a real TCP loopback socket.  The walkthrough:
//!
//! ```text
//! 1. master publishes an initial capture        (clients have nothing yet)
//! 2. both clients join and request the mesh     → each pulls it
//! 3. client A pushes a fresh capture            → master stores it
//! 4. master fans the update out                 → client B pulls it
//! 5. each client's display loop notices the     (BlobWatcher polling)
//!    change and "renders"
//! ```
//!
//! Useful for eyeballing the log flow; the same choreography is asserted
//! properly in `roomnet-master/tests/distribution_integration.rs`.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use roomnet_client::{BlobWatcher, ClientController};
use roomnet_core::capture::{FixedCapture, MeshCapture};
use roomnet_core::signaling::{LoopbackBus, SignalingChannel};
use roomnet_core::store::BlobStore;
use roomnet_master::{MasterConfig, MasterController};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("RoomNet demo starting");

    let bus = LoopbackBus::new();
    let config = MasterConfig {
        bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
        ..MasterConfig::default()
    };

    // ── Master ────────────────────────────────────────────────────────────────
    let (master_peer, master_inbound) = bus.join();
    let master_id = master_peer.local_id();
    let master_store = Arc::new(BlobStore::new());
    let (master, mut master_events) =
        MasterController::new(config, Arc::clone(&master_store), master_peer)
            .context("master config")?;
    tokio::spawn(Arc::clone(&master).run(master_inbound));

    // Drain master events into the log.
    tokio::spawn(async move {
        while let Some(event) = master_events.recv().await {
            info!("master event: {event:?}");
        }
    });

    // 1. The master has an initial capture before anyone joins; with no
    //    peers connected yet there is nothing to fan out.
    let initial = FixedCapture::new(b"initial room scan".to_vec());
    master.publish(initial.capture_current()).await?;

    // ── Clients ───────────────────────────────────────────────────────────────
    let mut clients = Vec::new();
    let mut watchers = Vec::new();
    for name in ["client-a", "client-b"] {
        let (peer, inbound) = bus.join();
        let store = Arc::new(BlobStore::new());
        let (client, mut events) = ClientController::new(Arc::clone(&store), peer, master_id);
        tokio::spawn(Arc::clone(&client).run(inbound));
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                info!("{name} event: {event:?}");
            }
        });
        watchers.push((name, BlobWatcher::new(Arc::clone(&store))));
        clients.push(client);
    }

    // 2. Both clients join-time request the current mesh.
    for client in &clients {
        client.request_blob().await?;
    }
    tokio::time::sleep(Duration::from_millis(300)).await;

    // 3. Client A scanned a fresh mesh and pushes it back.
    let fresh = FixedCapture::new(b"rescanned room with the couch moved".to_vec());
    clients[0].push_blob(fresh.capture_current()).await?;
    tokio::time::sleep(Duration::from_millis(300)).await;

    // 4./5. The display loops poll for changes.
    for (name, watcher) in &mut watchers {
        if let Some(mesh) = watcher.poll() {
            info!("{name} display renders {} bytes", mesh.len());
        }
    }
    info!(
        "master holds {} bytes; demo done",
        master_store.len()
    );
    Ok(())
}
