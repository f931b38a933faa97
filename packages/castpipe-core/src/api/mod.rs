//! HTTP layer for the media server.
//!
//! This module owns listener setup and the serve loop; the request
//! handler itself lives in [`http`].

use std::future::IntoFuture;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use socket2::{Domain, Protocol, Socket, Type};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::media::ServedFile;
use crate::protocol_constants::LISTEN_BACKLOG;
use crate::state::StreamingConfig;

pub mod http;
pub mod transfer;

pub use transfer::TransferGuard;

/// Errors that can occur when starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind the listening socket.
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// The file to serve is missing or not a regular file.
    #[error("Cannot serve {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The server worker or its runtime could not be started.
    #[error("Server runtime failed: {0}")]
    Runtime(#[from] io::Error),

    /// `start()` was called on a server that is already running.
    #[error("Server is already running")]
    AlreadyRunning,
}

/// Per-server request handler state.
///
/// Built once when a server starts and cloned into every request. Both
/// fields are immutable, so connections share them without locking.
#[derive(Clone)]
pub struct MediaHandler {
    /// The single file this server exposes.
    pub file: Arc<ServedFile>,
    /// Fixed vs. chunked delivery settings.
    pub streaming: StreamingConfig,
}

impl MediaHandler {
    pub fn new(file: Arc<ServedFile>, streaming: StreamingConfig) -> Self {
        Self { file, streaming }
    }
}

/// Binds a non-blocking listening socket on `addr`.
///
/// `SO_REUSEADDR` is set so a stopped server's port can be rebound
/// immediately, even while old connections sit in `TIME_WAIT`.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the address is unavailable.
pub fn bind_listener(addr: SocketAddr) -> Result<std::net::TcpListener, ServerError> {
    let bind_err = |source| ServerError::Bind { addr, source };

    let socket =
        Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP)).map_err(bind_err)?;
    socket.set_reuse_address(true).map_err(bind_err)?;
    socket.set_nonblocking(true).map_err(bind_err)?;
    socket.bind(&addr.into()).map_err(bind_err)?;
    socket.listen(LISTEN_BACKLOG).map_err(bind_err)?;

    Ok(socket.into())
}

/// Serves `handler` on `listener` until `shutdown` is cancelled.
///
/// Returning drops the listener, so no new connections are accepted.
/// Connections already in flight stay on the runtime; the caller decides
/// how long they may drain.
pub async fn serve(
    listener: tokio::net::TcpListener,
    handler: MediaHandler,
    shutdown: CancellationToken,
) -> io::Result<()> {
    let app = http::create_router(handler);
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .into_future();

    tokio::select! {
        result = server => result,
        () = shutdown.cancelled() => {
            log::info!("[Server] Shutdown requested, listener closed");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, TcpListener};

    #[test]
    fn bind_listener_reports_occupied_port() {
        let occupied = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let addr = occupied.local_addr().unwrap();

        let err = bind_listener(addr).unwrap_err();
        assert!(matches!(err, ServerError::Bind { addr: a, .. } if a == addr));
    }

    #[test]
    fn bind_listener_assigns_ephemeral_port() {
        let listener = bind_listener(SocketAddr::from((Ipv4Addr::LOCALHOST, 0))).unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }
}
