//! One live peer relationship: a duplex byte stream with independent read and
//! write loops.
//!
//! # Ownership
//!
//! A [`Connection`] is a cheap handle around shared state.  The endpoint that
//! created it (the server registry or the client endpoint) keeps the owning
//! handle; the spawned read and write tasks only hold a [`Weak`] reference
//! and stop as soon as it can no longer be upgraded or the connection is
//! closed.  Inbound envelopes refer to the connection by [`ConnectionId`],
//! never by handle.
//!
//! # Loops
//!
//! - The **read loop** reads exactly one 12-byte record at a time, pushes an
//!   [`Envelope`] into the shared inbound queue and immediately reads again.
//!   Any read or decode failure closes the connection and ends the loop.
//! - The **write loop** is armed by [`Connection::send`] when no loop is
//!   running.  It writes the front of the outbound queue, pops it once the
//!   write completed, and keeps going until the queue is empty.  A write
//!   failure closes the connection and abandons whatever is still queued.
//!   Closing the connection interrupts a write that is still pending and
//!   drops the write half, so a peer that stops reading cannot keep the
//!   stream open.
//!
//! At most one write loop exists per connection: `writer_armed` is claimed
//! with a swap before spawning and only released after the queue was seen
//! empty, with a re-check that closes the release/push race.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use guess_core::{
    decode_message, encode_message, ConcurrentQueue, ConnectionId, Envelope, WireMessage,
    WIRE_MESSAGE_SIZE,
};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Which side of the peer relationship a connection lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Created by the server's accept loop; inbound envelopes carry its id.
    ServerSide,
    /// Held by a client endpoint; inbound envelopes carry no origin.
    ClientSide,
}

/// Handle to one peer connection.
#[derive(Clone)]
pub struct Connection {
    shared: Arc<Shared>,
}

struct Shared {
    id: ConnectionId,
    role: Role,
    open: AtomicBool,
    writer_armed: AtomicBool,
    outbound: ConcurrentQueue<WireMessage>,
    reader: Mutex<Option<BoxedReader>>,
    writer: Mutex<Option<BoxedWriter>>,
    closed: Arc<Notify>,
    writer_cancel: Arc<Notify>,
    inbound: Arc<ConcurrentQueue<Envelope>>,
    runtime: Handle,
}

impl Connection {
    /// Wraps an already-connected stream.
    ///
    /// The connection starts open.  Nothing is read until
    /// [`Connection::begin_receiving`] is called; all I/O tasks are spawned on
    /// `runtime`.
    pub fn open<S>(
        stream: S,
        role: Role,
        id: ConnectionId,
        inbound: Arc<ConcurrentQueue<Envelope>>,
        runtime: Handle,
    ) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        Self {
            shared: Arc::new(Shared {
                id,
                role,
                open: AtomicBool::new(true),
                writer_armed: AtomicBool::new(false),
                outbound: ConcurrentQueue::new(),
                reader: Mutex::new(Some(Box::new(reader))),
                writer: Mutex::new(Some(Box::new(writer))),
                closed: Arc::new(Notify::new()),
                writer_cancel: Arc::new(Notify::new()),
                inbound,
                runtime,
            }),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.shared.id
    }

    pub fn role(&self) -> Role {
        self.shared.role
    }

    /// `true` until the connection has been closed for any reason.
    pub fn is_connected(&self) -> bool {
        self.shared.is_open()
    }

    /// Number of outbound messages not yet fully written.
    pub fn pending_outbound(&self) -> usize {
        self.shared.outbound.len()
    }

    /// Arms the read loop.  Calling it again, or on a closed connection, does
    /// nothing.
    pub fn begin_receiving(&self) {
        if !self.is_connected() {
            return;
        }
        let Some(reader) = lock(&self.shared.reader).take() else {
            return;
        };

        let origin = match self.shared.role {
            Role::ServerSide => Some(self.shared.id),
            Role::ClientSide => None,
        };
        let task = ReadLoop {
            conn: Arc::downgrade(&self.shared),
            closed: Arc::clone(&self.shared.closed),
            inbound: Arc::clone(&self.shared.inbound),
            origin,
        };
        self.shared.runtime.spawn(task.run(reader));
    }

    /// Queues `message` for delivery.
    ///
    /// Messages from one connection reach the wire in the order they were
    /// queued.  A no-op once the connection is closed.
    pub fn send(&self, message: WireMessage) {
        if !self.is_connected() {
            return;
        }
        self.shared.outbound.push_back(message);
        if !self.shared.writer_armed.swap(true, Ordering::SeqCst) {
            self.shared.runtime.spawn(write_loop(
                Arc::downgrade(&self.shared),
                Arc::clone(&self.shared.writer_cancel),
            ));
        }
    }

    /// Closes the connection.  Idempotent.
    pub fn disconnect(&self) {
        self.shared.close("local disconnect");
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.shared.id)
            .field("role", &self.shared.role)
            .field("open", &self.is_connected())
            .field("pending_outbound", &self.pending_outbound())
            .finish()
    }
}

impl Shared {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Transitions to closed exactly once.
    fn close(&self, reason: &str) {
        if !self.open.swap(false, Ordering::SeqCst) {
            return;
        }
        info!("connection {} closed: {reason}", self.id);

        self.outbound.clear();
        // Each loop waits on its own `Notify`; a stored permit wakes a loop
        // that is not parked yet.
        self.closed.notify_one();
        self.writer_cancel.notify_one();
        lock(&self.reader).take();
        if let Some(writer) = lock(&self.writer).take() {
            self.runtime.spawn(shutdown_writer(writer, self.id));
        }
    }

    fn take_writer(&self) -> Option<BoxedWriter> {
        if !self.is_open() {
            return None;
        }
        lock(&self.writer).take()
    }

    fn restore_writer(&self, writer: BoxedWriter) {
        let mut slot = lock(&self.writer);
        if self.is_open() {
            *slot = Some(writer);
        } else {
            drop(slot);
            self.runtime.spawn(shutdown_writer(writer, self.id));
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        // The last handle went away without a disconnect; release the stream.
        self.close("all handles dropped");
    }
}

// ── Read loop ─────────────────────────────────────────────────────────────────

struct ReadLoop {
    conn: Weak<Shared>,
    closed: Arc<Notify>,
    inbound: Arc<ConcurrentQueue<Envelope>>,
    origin: Option<ConnectionId>,
}

impl ReadLoop {
    async fn run(self, mut reader: BoxedReader) {
        let mut buffer = [0u8; WIRE_MESSAGE_SIZE];
        loop {
            let read = tokio::select! {
                result = reader.read_exact(&mut buffer) => result,
                () = self.closed.notified() => return,
            };

            let Some(conn) = self.conn.upgrade() else {
                return;
            };
            if !conn.is_open() {
                return;
            }

            if let Err(e) = read {
                if e.kind() == std::io::ErrorKind::UnexpectedEof {
                    conn.close("peer closed the stream");
                } else {
                    warn!("read error on connection {}: {e}", conn.id);
                    conn.close("read failure");
                }
                return;
            }

            match decode_message(&buffer) {
                Ok((message, _)) => {
                    debug!("connection {} received {message}", conn.id);
                    self.inbound.push_back(Envelope::new(message, self.origin));
                }
                Err(e) => {
                    warn!("undecodable record on connection {}: {e}", conn.id);
                    conn.close("protocol error");
                    return;
                }
            }
        }
    }
}

// ── Write loop ────────────────────────────────────────────────────────────────

async fn write_loop(conn: Weak<Shared>, cancel: Arc<Notify>) {
    loop {
        let mut writer = {
            let Some(shared) = conn.upgrade() else {
                return;
            };
            match shared.take_writer() {
                Some(writer) => writer,
                None => {
                    shared.writer_armed.store(false, Ordering::SeqCst);
                    return;
                }
            }
        };

        loop {
            let message = {
                let Some(shared) = conn.upgrade() else {
                    return;
                };
                if !shared.is_open() {
                    break;
                }
                match shared.outbound.front() {
                    Some(message) => message,
                    None => break,
                }
            };

            // Only the weak reference and the write half live across this
            // await.  A close drops the write half right here.
            let result = tokio::select! {
                result = write_record(&mut writer, &message) => result,
                () = cancel.notified() => return,
            };

            let Some(shared) = conn.upgrade() else {
                return;
            };
            if let Err(e) = result {
                warn!("write error on connection {}: {e}", shared.id);
                shared.close("write failure");
                break;
            }
            debug!("connection {} sent {message}", shared.id);
            shared.outbound.pop_front();
        }

        let Some(shared) = conn.upgrade() else {
            return;
        };
        shared.restore_writer(writer);
        shared.writer_armed.store(false, Ordering::SeqCst);

        // A send that raced the release above either re-armed a fresh loop
        // (swap fails here) or left its message for us to pick up.
        if !shared.is_open()
            || shared.outbound.is_empty()
            || shared.writer_armed.swap(true, Ordering::SeqCst)
        {
            return;
        }
    }
}

async fn write_record(writer: &mut BoxedWriter, message: &WireMessage) -> std::io::Result<()> {
    writer.write_all(&encode_message(message)).await?;
    writer.flush().await
}

async fn shutdown_writer(mut writer: BoxedWriter, id: ConnectionId) {
    if let Err(e) = writer.shutdown().await {
        debug!("shutdown of connection {id} failed: {e}");
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
