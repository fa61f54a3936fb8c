//! Client endpoint: one outbound connection to a server.
//!
//! `connect` resolves and connects synchronously, so the caller knows the
//! outcome before it returns.  Once connected, reading and writing happen on
//! the endpoint's I/O thread and inbound messages land in
//! [`ClientEndpoint::inbound`] without an origin.

use std::net::SocketAddr;
use std::sync::Arc;

use guess_core::{ConcurrentQueue, ConnectionId, Envelope, WireMessage};
use thiserror::Error;
use tokio::net::{lookup_host, TcpStream};
use tracing::{debug, info, warn};

use crate::connection::{Connection, Role};
use crate::io_thread::{build_runtime, IoThread};

/// Error type for client endpoint operations.
#[derive(Debug, Error)]
pub enum ClientNetworkError {
    #[error("could not resolve {host}: {source}")]
    ResolveFailed {
        host: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} resolved to no addresses")]
    NoAddress(String),
    #[error("connection to {addr} failed: {source}")]
    ConnectFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("already connected")]
    AlreadyConnected,
    #[error("not connected")]
    NotConnected,
    #[error("failed to start I/O thread: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Connects to one server and exchanges messages with it.
pub struct ClientEndpoint {
    inbound: Arc<ConcurrentQueue<Envelope>>,
    connection: Option<Connection>,
    io: Option<IoThread>,
}

impl Default for ClientEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientEndpoint {
    pub fn new() -> Self {
        Self {
            inbound: Arc::new(ConcurrentQueue::new()),
            connection: None,
            io: None,
        }
    }

    /// Resolves `host:port`, connects to the first address that accepts, and
    /// starts receiving.
    ///
    /// # Errors
    ///
    /// - [`ClientNetworkError::AlreadyConnected`] while a connection is live.
    /// - [`ClientNetworkError::ResolveFailed`] / [`ClientNetworkError::NoAddress`]
    ///   when the name does not resolve.
    /// - [`ClientNetworkError::ConnectFailed`] with the last address tried when
    ///   every address refuses.
    pub fn connect(&mut self, host: &str, port: u16) -> Result<(), ClientNetworkError> {
        if self.is_connected() {
            return Err(ClientNetworkError::AlreadyConnected);
        }
        // Tear down whatever is left of a previous, already closed connection.
        self.disconnect();

        let runtime = build_runtime().map_err(ClientNetworkError::Runtime)?;
        let (stream, addr) = runtime.block_on(connect_any(host, port))?;

        let io = IoThread::spawn(runtime, "guess-client-io", std::future::pending())
            .map_err(ClientNetworkError::Runtime)?;
        let conn = Connection::open(
            stream,
            Role::ClientSide,
            ConnectionId(0),
            Arc::clone(&self.inbound),
            io.handle().clone(),
        );
        conn.begin_receiving();

        info!("connected to {addr}");
        self.connection = Some(conn);
        self.io = Some(io);
        Ok(())
    }

    /// Closes the connection and stops the I/O thread.  A no-op when not
    /// connected.
    pub fn disconnect(&mut self) {
        if let Some(conn) = self.connection.take() {
            conn.disconnect();
        }
        if let Some(mut io) = self.io.take() {
            io.stop();
            debug!("client I/O thread stopped");
        }
    }

    /// `true` while the connection is open.  Becomes `false` on its own when
    /// the server goes away.
    pub fn is_connected(&self) -> bool {
        self.connection.as_ref().is_some_and(Connection::is_connected)
    }

    /// Queues `message` for the server.
    ///
    /// # Errors
    ///
    /// Returns [`ClientNetworkError::NotConnected`] when there is no open
    /// connection; nothing is sent in that case.
    pub fn send(&self, message: WireMessage) -> Result<(), ClientNetworkError> {
        match &self.connection {
            Some(conn) if conn.is_connected() => {
                conn.send(message);
                Ok(())
            }
            _ => Err(ClientNetworkError::NotConnected),
        }
    }

    /// The queue inbound envelopes are deposited into.
    pub fn inbound(&self) -> &ConcurrentQueue<Envelope> {
        &self.inbound
    }
}

impl Drop for ClientEndpoint {
    fn drop(&mut self) {
        self.disconnect();
    }
}

async fn connect_any(host: &str, port: u16) -> Result<(TcpStream, SocketAddr), ClientNetworkError> {
    let addrs: Vec<SocketAddr> = lookup_host((host, port))
        .await
        .map_err(|source| ClientNetworkError::ResolveFailed {
            host: host.to_string(),
            source,
        })?
        .collect();

    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                if let Err(e) = stream.set_nodelay(true) {
                    warn!("could not disable Nagle on {addr}: {e}");
                }
                return Ok((stream, addr));
            }
            Err(source) => {
                debug!("connect to {addr} failed: {source}");
                last_err = Some(ClientNetworkError::ConnectFailed { addr, source });
            }
        }
    }
    Err(last_err.unwrap_or_else(|| ClientNetworkError::NoAddress(format!("{host}:{port}"))))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
