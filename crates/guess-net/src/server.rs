//! Server endpoint: accept loop, connection registry, and broadcast.
//!
//! # Registry
//!
//! Accepted connections are kept in accept order in a mutex-guarded `Vec`.
//! The accept task (I/O thread) appends to it and the application thread
//! reads, sends and prunes through it, always under the lock and never across
//! an `.await`.  Dead entries are removed lazily, when a send or broadcast
//! finds them closed.
//!
//! # Inbound
//!
//! Every server-side connection pushes into the single shared inbound queue,
//! tagging each envelope with its [`ConnectionId`].  The application either
//! blocks on [`ServerEndpoint::inbound`] or calls
//! [`ServerEndpoint::drain_inbound`] with a [`MessageHandler`].

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use guess_core::{ConcurrentQueue, ConnectionId, Envelope, WireMessage};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

use crate::connection::{Connection, Role};
use crate::io_thread::{build_runtime, IoThread};

/// Pause after a failed accept, so a persistent error (e.g. out of file
/// descriptors) does not spin the I/O thread.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Error type for server endpoint operations.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("bind failed on {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    /// The runtime or its thread could not be created.
    #[error("failed to start I/O thread: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("server is already running")]
    AlreadyRunning,
}

/// Receives the envelopes handed out by [`ServerEndpoint::drain_inbound`].
pub trait MessageHandler {
    fn handle_message(&mut self, server: &ServerEndpoint, envelope: Envelope);
}

impl<F> MessageHandler for F
where
    F: FnMut(&ServerEndpoint, Envelope),
{
    fn handle_message(&mut self, server: &ServerEndpoint, envelope: Envelope) {
        self(server, envelope)
    }
}

type Registry = Arc<Mutex<Vec<Connection>>>;

/// Accepts many peers and exchanges messages with them.
pub struct ServerEndpoint {
    registry: Registry,
    inbound: Arc<ConcurrentQueue<Envelope>>,
    next_id: Arc<AtomicU64>,
    io: Option<IoThread>,
    local_addr: Option<SocketAddr>,
}

impl Default for ServerEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerEndpoint {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Vec::new())),
            inbound: Arc::new(ConcurrentQueue::new()),
            next_id: Arc::new(AtomicU64::new(0)),
            io: None,
            local_addr: None,
        }
    }

    /// Binds `0.0.0.0:port` and starts accepting.
    ///
    /// # Errors
    ///
    /// See [`ServerEndpoint::start_on`].
    pub fn start(&mut self, port: u16) -> Result<(), NetworkError> {
        self.start_on(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
    }

    /// Binds `addr`, starts the I/O thread and arms the accept loop.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::BindFailed`] if the address cannot be bound,
    /// [`NetworkError::AlreadyRunning`] if the server was already started, and
    /// [`NetworkError::Runtime`] if the I/O thread cannot be created.  No
    /// accept loop is armed on failure.
    pub fn start_on(&mut self, addr: SocketAddr) -> Result<(), NetworkError> {
        if self.io.is_some() {
            return Err(NetworkError::AlreadyRunning);
        }

        let runtime = build_runtime().map_err(NetworkError::Runtime)?;
        let listener = runtime
            .block_on(TcpListener::bind(addr))
            .map_err(|source| NetworkError::BindFailed { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| NetworkError::BindFailed { addr, source })?;

        let accept = AcceptLoop {
            listener,
            registry: Arc::clone(&self.registry),
            inbound: Arc::clone(&self.inbound),
            next_id: Arc::clone(&self.next_id),
            runtime: runtime.handle().clone(),
        };
        let io = IoThread::spawn(runtime, "guess-server-io", accept.run())
            .map_err(NetworkError::Runtime)?;

        info!("server listening on {local_addr}");
        self.io = Some(io);
        self.local_addr = Some(local_addr);
        Ok(())
    }

    /// Stops the I/O thread and forgets every connection.
    ///
    /// Safe to call when the server was never started or is already stopped.
    pub fn stop(&mut self) {
        let Some(mut io) = self.io.take() else {
            return;
        };
        for conn in self.lock_registry().drain(..) {
            conn.disconnect();
        }
        io.stop();
        self.local_addr = None;
        info!("server stopped");
    }

    pub fn is_running(&self) -> bool {
        self.io.is_some()
    }

    /// The bound address while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// The queue every connection deposits inbound envelopes into.
    pub fn inbound(&self) -> &ConcurrentQueue<Envelope> {
        &self.inbound
    }

    /// Looks up a registered connection by id.
    pub fn connection(&self, id: ConnectionId) -> Option<Connection> {
        self.lock_registry().iter().find(|c| c.id() == id).cloned()
    }

    /// Ids of every registered connection, in accept order.
    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.lock_registry().iter().map(Connection::id).collect()
    }

    /// Number of registered connections, including ones not yet pruned.
    pub fn connection_count(&self) -> usize {
        self.lock_registry().len()
    }

    /// Queues `message` on connection `id`.
    ///
    /// Returns `false` when the connection is gone; a closed entry is pruned
    /// from the registry on the way.
    pub fn send_to(&self, id: ConnectionId, message: WireMessage) -> bool {
        let mut registry = self.lock_registry();
        let Some(index) = registry.iter().position(|c| c.id() == id) else {
            debug!("send to unknown connection {id} dropped");
            return false;
        };
        if registry[index].is_connected() {
            registry[index].send(message);
            true
        } else {
            registry.remove(index);
            debug!("pruned closed connection {id}");
            false
        }
    }

    /// Queues `message` on every live connection and prunes the dead ones.
    ///
    /// Returns the number of connections the message was queued on.
    pub fn broadcast(&self, message: WireMessage) -> usize {
        let mut registry = self.lock_registry();
        let mut delivered = 0;
        let mut found_dead = false;
        for conn in registry.iter() {
            if conn.is_connected() {
                conn.send(message);
                delivered += 1;
            } else {
                found_dead = true;
            }
        }
        if found_dead {
            let before = registry.len();
            registry.retain(Connection::is_connected);
            debug!("pruned {} closed connection(s)", before - registry.len());
        }
        delivered
    }

    /// Hands up to `max` queued envelopes (all of them for `None`) to
    /// `handler`, oldest first.  Never blocks; returns how many were handled.
    pub fn drain_inbound<H>(&self, max: Option<usize>, handler: &mut H) -> usize
    where
        H: MessageHandler + ?Sized,
    {
        let limit = max.unwrap_or(usize::MAX);
        let mut handled = 0;
        while handled < limit {
            let Some(envelope) = self.inbound.pop_front() else {
                break;
            };
            handler.handle_message(self, envelope);
            handled += 1;
        }
        handled
    }

    fn lock_registry(&self) -> MutexGuard<'_, Vec<Connection>> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ServerEndpoint {
    fn drop(&mut self) {
        self.stop();
    }
}

// ── Accept loop ───────────────────────────────────────────────────────────────

struct AcceptLoop {
    listener: TcpListener,
    registry: Registry,
    inbound: Arc<ConcurrentQueue<Envelope>>,
    next_id: Arc<AtomicU64>,
    runtime: Handle,
}

impl AcceptLoop {
    async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    if let Err(e) = stream.set_nodelay(true) {
                        warn!("could not disable Nagle for {peer}: {e}");
                    }
                    let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
                    let conn = Connection::open(
                        stream,
                        Role::ServerSide,
                        id,
                        Arc::clone(&self.inbound),
                        self.runtime.clone(),
                    );
                    conn.begin_receiving();
                    self.registry
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(conn);
                    info!("accepted connection {id} from {peer}");
                }
                Err(e) => {
                    // One failed accept must not stop the server.
                    error!("accept error: {e}");
                    tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                }
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
