//! Integration tests for the transfer channel against real loopback sockets.
//!
//! # Purpose
//!
//! These tests exercise the transfer primitives through their *public* API
//! exactly the way the role controllers use them:
//!
//! - The happy paths: serve/fetch moves a payload intact, push/receive moves
//!   it in the opposite direction.
//! - Resource hygiene: once a serve completes, its port can be bound again
//!   immediately — nothing leaks.
//! - The error paths: connecting where nothing listens reports `Refused`;
//!   binding a taken port reports `BindInUse`.
//!
//! Every network-facing test is wrapped in a generous `tokio::time::timeout`
//! because the primitives themselves (deliberately) carry none.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use tokio::time::timeout;

use roomnet_core::peer::PeerAddress;
use roomnet_core::transfer::{fetch_once, push_once, BlobListener, TransferError};

const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
const TEST_TIMEOUT: Duration = Duration::from_secs(10);

fn loopback_addr(port: u16) -> PeerAddress {
    PeerAddress::new("127.0.0.1", port).expect("loopback is a valid host")
}

#[tokio::test]
async fn test_serve_once_and_fetch_once_move_the_payload_intact() {
    let payload: Vec<u8> = (0..=255u8).cycle().take(64 * 1024).collect();

    // Bind first, learn the ephemeral port, only then let the fetcher know —
    // the same listen-then-announce ordering the protocol mandates.
    let listener = BlobListener::bind(LOCALHOST, 0).await.expect("bind");
    let port = listener.local_addr().port();

    let serve = {
        let payload = payload.clone();
        tokio::spawn(async move { listener.serve_once(&payload).await })
    };

    let fetched = timeout(TEST_TIMEOUT, fetch_once(&loopback_addr(port)))
        .await
        .expect("fetch must finish in time")
        .expect("fetch must succeed");
    assert_eq!(fetched, payload);

    let sent = serve.await.expect("serve task").expect("serve result");
    assert_eq!(sent, payload.len());

    // Both sides released their sockets: the same port binds again at once.
    BlobListener::bind(LOCALHOST, port)
        .await
        .expect("port must be free after a completed serve");
}

#[tokio::test]
async fn test_push_once_and_receive_once_move_the_payload_intact() {
    let payload = vec![0xAB; 4096];

    let listener = BlobListener::bind(LOCALHOST, 0).await.expect("bind");
    let port = listener.local_addr().port();

    let receive = tokio::spawn(async move { listener.receive_once().await });

    let sent = timeout(TEST_TIMEOUT, push_once(&loopback_addr(port), &payload))
        .await
        .expect("push must finish in time")
        .expect("push must succeed");
    assert_eq!(sent, payload.len());

    let received = receive.await.expect("receive task").expect("receive result");
    assert_eq!(received, payload);
}

#[tokio::test]
async fn test_fetch_against_a_dead_port_reports_refused() {
    // Bind and immediately drop a listener to obtain a port that is known
    // to be closed right now.
    let port = {
        let listener = BlobListener::bind(LOCALHOST, 0).await.expect("bind");
        listener.local_addr().port()
    };

    let err = timeout(TEST_TIMEOUT, fetch_once(&loopback_addr(port)))
        .await
        .expect("a refused connect must not hang")
        .expect_err("nothing is listening");
    assert!(matches!(err, TransferError::Refused { .. }), "{err}");
}

#[tokio::test]
async fn test_binding_a_taken_port_reports_bind_in_use() {
    let holder = BlobListener::bind(LOCALHOST, 0).await.expect("bind");
    let port = holder.local_addr().port();

    let err = BlobListener::bind(LOCALHOST, port)
        .await
        .expect_err("port is held");
    assert!(matches!(err, TransferError::BindInUse { .. }), "{err}");
}

#[tokio::test]
async fn test_serve_next_fans_out_to_several_fetchers_from_one_listener() {
    let payload = vec![0x5A; 10_000];

    let listener = BlobListener::bind(LOCALHOST, 0).await.expect("bind");
    let port = listener.local_addr().port();

    let fan_out = {
        let payload = payload.clone();
        tokio::spawn(async move {
            for _ in 0..3 {
                listener.serve_next(&payload).await?;
            }
            Ok::<_, TransferError>(())
        })
    };

    for _ in 0..3 {
        let fetched = timeout(TEST_TIMEOUT, fetch_once(&loopback_addr(port)))
            .await
            .expect("fetch must finish in time")
            .expect("fetch must succeed");
        assert_eq!(fetched, payload);
    }

    fan_out.await.expect("fan-out task").expect("fan-out result");
}

#[tokio::test]
async fn test_empty_payload_serves_as_zero_bytes_on_the_wire() {
    // The protocol layer never *chooses* to serve an empty blob (it replies
    // BlobUnavailable instead), but the transport must still be well-defined
    // for a zero-length write: the fetcher sees an immediate clean EOF.
    let listener = BlobListener::bind(LOCALHOST, 0).await.expect("bind");
    let port = listener.local_addr().port();

    let serve = tokio::spawn(async move { listener.serve_once(&[]).await });

    let fetched = timeout(TEST_TIMEOUT, fetch_once(&loopback_addr(port)))
        .await
        .expect("fetch must finish in time")
        .expect("fetch must succeed");
    assert!(fetched.is_empty());
    assert_eq!(serve.await.expect("task").expect("serve"), 0);
}
