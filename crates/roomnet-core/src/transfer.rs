//! The raw point-to-point byte-stream path used for bulk mesh movement.
//!
//! # Wire contract
//!
//! There is deliberately no framing at all: no header, no length prefix, no
//! checksum.  The sender writes the whole payload and closes its end of the
//! TCP stream; the receiver reads until end-of-stream and treats "connection
//! closed by sender" as "message complete".  This is the exact contract the
//! original deployment shipped with — simple and robust against partial
//! writes, but with a known gap: a connection reset mid-transfer is
//! indistinguishable on the wire from a short message, so the receiver
//! relies on the transport error surfacing through [`TransferError::Reset`].
//! Kept as observed rather than silently strengthened.
//!
//! # Sessions are ephemeral
//!
//! Every transfer gets its own connection, torn down immediately after the
//! payload moves.  The serving side likewise binds a listener per exchange:
//! [`BlobListener::bind`] first (so the caller can advertise a *bound*
//! address — listen-then-announce is a hard protocol invariant), then one of
//! the accept-side operations:
//!
//! - [`BlobListener::serve_once`] — accept one connection, write, close all.
//! - [`BlobListener::serve_next`] — the same, but keeping the listener for
//!   fan-out to a known number of peers.
//! - [`BlobListener::receive_once`] — accept one connection, read to end:
//!   the passive dual of [`fetch_once`], used when the master takes delivery
//!   of a client's push.
//!
//! The connect-side duals are [`fetch_once`] (pull) and [`push_once`]
//! (deliver).  None of the primitives has a built-in timeout; a stalled peer
//! parks the worker task driving it.  That limitation is accepted here —
//! callers who need deadlines wrap these futures in `tokio::time::timeout`.
//!
//! No primitive retries on its own.  Failures are classified and returned;
//! retry policy belongs to the call site.

use std::io;
use std::net::{IpAddr, SocketAddr};

use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::debug;

use crate::peer::PeerAddress;

/// Error type for transfer-channel operations.
///
/// Mirrors the failure taxonomy the role controllers care about; anything
/// else falls through as [`TransferError::Io`].
#[derive(Debug, Error)]
pub enum TransferError {
    /// The remote endpoint refused the connection (nothing listening).
    #[error("connection to {addr} refused: {source}")]
    Refused {
        addr: String,
        #[source]
        source: io::Error,
    },
    /// The stream died mid-transfer; the payload is incomplete.
    #[error("connection reset mid-transfer: {source}")]
    Reset {
        #[source]
        source: io::Error,
    },
    /// The listening port is already taken.
    #[error("bind failed on {addr}, address in use: {source}")]
    BindInUse {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    /// Any other transport-level I/O failure.
    #[error("transfer I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Classifies an error from a stream read/write.
fn stream_error(source: io::Error) -> TransferError {
    match source.kind() {
        io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe => TransferError::Reset { source },
        _ => TransferError::Io(source),
    }
}

/// Classifies an error from an outbound connect.
fn connect_error(addr: &PeerAddress, source: io::Error) -> TransferError {
    match source.kind() {
        io::ErrorKind::ConnectionRefused => TransferError::Refused {
            addr: addr.to_string(),
            source,
        },
        _ => TransferError::Io(source),
    }
}

/// A bound, not-yet-serving transfer listener.
///
/// Binding is separated from serving so that callers can learn the actual
/// local port (ephemeral ports are the default policy) and advertise it over
/// signaling *after* the socket is listening but *before* any peer could
/// try to connect — closing the connect-before-listen race by construction.
///
/// The listener is a plain RAII resource: it is released when the value is
/// dropped, on every exit path, success or failure.
#[derive(Debug)]
pub struct BlobListener {
    inner: TcpListener,
    local: SocketAddr,
}

impl BlobListener {
    /// Binds a listener on `ip:port`.  Port 0 requests an OS-assigned
    /// ephemeral port; read it back with [`BlobListener::local_addr`].
    ///
    /// # Errors
    ///
    /// [`TransferError::BindInUse`] when a fixed port is already taken.
    pub async fn bind(ip: IpAddr, port: u16) -> Result<Self, TransferError> {
        let requested = SocketAddr::new(ip, port);
        let inner = TcpListener::bind(requested).await.map_err(|source| {
            if source.kind() == io::ErrorKind::AddrInUse {
                TransferError::BindInUse {
                    addr: requested,
                    source,
                }
            } else {
                TransferError::Io(source)
            }
        })?;
        let local = inner.local_addr()?;
        debug!("transfer listener bound on {local}");
        Ok(Self { inner, local })
    }

    /// The actual bound address (with the resolved ephemeral port).
    pub fn local_addr(&self) -> SocketAddr {
        self.local
    }

    /// Accepts exactly one inbound connection, writes the full `payload`,
    /// then closes both the connection and the listener.
    ///
    /// Returns the number of bytes sent.
    pub async fn serve_once(self, payload: &[u8]) -> Result<usize, TransferError> {
        // Consuming `self` drops the listener on every exit path.
        self.serve_next(payload).await
    }

    /// Accepts one inbound connection and writes the full `payload`, keeping
    /// the listener open for further accepts.
    ///
    /// Used by the master's fan-out loop, which serves one connection per
    /// peer it has notified of an update.
    pub async fn serve_next(&self, payload: &[u8]) -> Result<usize, TransferError> {
        let (mut stream, remote) = self.inner.accept().await?;
        debug!("serving {} bytes to {remote}", payload.len());
        stream.write_all(payload).await.map_err(stream_error)?;
        // Flush the FIN so the receiver's read-to-end terminates.
        stream.shutdown().await.map_err(stream_error)?;
        Ok(payload.len())
    }

    /// Accepts exactly one inbound connection and reads until the remote
    /// closes the stream, then closes the listener.
    ///
    /// This is the passive dual of [`fetch_once`]: the sender connects and
    /// writes, this side takes delivery.
    pub async fn receive_once(self) -> Result<Vec<u8>, TransferError> {
        let (mut stream, remote) = self.inner.accept().await?;
        let mut payload = Vec::new();
        stream
            .read_to_end(&mut payload)
            .await
            .map_err(stream_error)?;
        debug!("received {} bytes from {remote}", payload.len());
        Ok(payload)
    }
}

/// Connects to `addr` and reads until the remote closes the stream.
///
/// Returns all bytes read as the payload.  The host part may be an IPv4
/// literal or a resolvable hostname.
///
/// # Errors
///
/// [`TransferError::Refused`] when nothing is listening;
/// [`TransferError::Reset`] when the stream dies mid-read.  A failed fetch
/// delivers no partial payload to the caller.
pub async fn fetch_once(addr: &PeerAddress) -> Result<Vec<u8>, TransferError> {
    let mut stream = TcpStream::connect((addr.host(), addr.port()))
        .await
        .map_err(|e| connect_error(addr, e))?;
    let mut payload = Vec::new();
    stream
        .read_to_end(&mut payload)
        .await
        .map_err(stream_error)?;
    debug!("fetched {} bytes from {addr}", payload.len());
    Ok(payload)
}

/// Connects to `addr`, writes the full `payload`, and closes.
///
/// The active dual of [`BlobListener::receive_once`]; returns the number of
/// bytes sent.
pub async fn push_once(addr: &PeerAddress, payload: &[u8]) -> Result<usize, TransferError> {
    let mut stream = TcpStream::connect((addr.host(), addr.port()))
        .await
        .map_err(|e| connect_error(addr, e))?;
    stream.write_all(payload).await.map_err(stream_error)?;
    stream.shutdown().await.map_err(stream_error)?;
    debug!("pushed {} bytes to {addr}", payload.len());
    Ok(payload.len())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
//
// Socket-level integration coverage lives in `tests/transfer_io.rs`; here we
// only pin down the error classification, which is pure.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_error_classifies_resets() {
        for kind in [
            io::ErrorKind::ConnectionReset,
            io::ErrorKind::ConnectionAborted,
            io::ErrorKind::BrokenPipe,
        ] {
            let e = stream_error(io::Error::new(kind, "boom"));
            assert!(matches!(e, TransferError::Reset { .. }), "{kind:?}");
        }
    }

    #[test]
    fn test_stream_error_passes_through_other_kinds() {
        let e = stream_error(io::Error::new(io::ErrorKind::TimedOut, "slow"));
        assert!(matches!(e, TransferError::Io(_)));
    }

    #[test]
    fn test_connect_error_classifies_refused() {
        let addr = PeerAddress::new("127.0.0.1", 1).unwrap();
        let e = connect_error(
            &addr,
            io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
        );
        assert!(matches!(e, TransferError::Refused { .. }));
    }
}
