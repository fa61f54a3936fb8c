//! All Guess-Wire protocol message types.
//!
//! Every message on the wire is a fixed-size record: a 4-byte kind tag followed
//! by an 8-byte signed payload.  There is no length prefix, no version byte and
//! no checksum; the record size alone delimits messages.

use std::fmt;

// ── Protocol constants ────────────────────────────────────────────────────────

/// Size in bytes of one encoded [`WireMessage`]: `kind` (4) + `value` (8).
pub const WIRE_MESSAGE_SIZE: usize = 12;

// ── Message kinds ─────────────────────────────────────────────────────────────

/// Closed enumeration of message kinds.  The discriminant is the on-wire tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MessageKind {
    /// Server → all players: a new experiment has started.
    Broadcast = 0,
    /// Server → player: the guess was greater than the target.
    Greater = 1,
    /// Server → player: the guess was correct.
    Equals = 2,
    /// Server → player: the guess was less than the target.
    Less = 3,
    /// Player → server: a guess, carried in `value`.
    Response = 4,
    /// Server → all players: the current experiment has ended.
    Finish = 5,
}

impl MessageKind {
    /// Every kind, in tag order.
    pub const ALL: [MessageKind; 6] = [
        MessageKind::Broadcast,
        MessageKind::Greater,
        MessageKind::Equals,
        MessageKind::Less,
        MessageKind::Response,
        MessageKind::Finish,
    ];
}

impl TryFrom<u32> for MessageKind {
    type Error = ();

    fn try_from(value: u32) -> Result<Self, ()> {
        match value {
            0 => Ok(MessageKind::Broadcast),
            1 => Ok(MessageKind::Greater),
            2 => Ok(MessageKind::Equals),
            3 => Ok(MessageKind::Less),
            4 => Ok(MessageKind::Response),
            5 => Ok(MessageKind::Finish),
            _ => Err(()),
        }
    }
}

// ── Wire message ──────────────────────────────────────────────────────────────

/// The unit of transmission: a kind tag plus a 64-bit signed payload.
///
/// Immutable once built and `Copy`, so it is passed by value across threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WireMessage {
    kind: MessageKind,
    value: i64,
}

impl WireMessage {
    pub const fn new(kind: MessageKind, value: i64) -> Self {
        Self { kind, value }
    }

    /// A message whose payload carries no meaning (value 0).
    pub const fn signal(kind: MessageKind) -> Self {
        Self::new(kind, 0)
    }

    pub const fn kind(&self) -> MessageKind {
        self.kind
    }

    pub const fn value(&self) -> i64 {
        self.value
    }
}

impl fmt::Display for WireMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self.kind, self.value)
    }
}

// ── Connection identity ───────────────────────────────────────────────────────

/// Identity the server assigns to each accepted connection.
///
/// Ids increase monotonically and are never reused within a process.  An id
/// is only a lookup key into the server's registry; holding one does not keep
/// the connection alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ── Inbound envelope ──────────────────────────────────────────────────────────

/// An inbound message together with the connection it arrived on.
///
/// `origin` is always `None` on the client side (the only peer is the server).
/// On the server side it names the registered connection; it may refer to a
/// connection that has since closed, so callers must treat a failed lookup as
/// "connection gone".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope {
    pub message: WireMessage,
    pub origin: Option<ConnectionId>,
}

impl Envelope {
    pub const fn new(message: WireMessage, origin: Option<ConnectionId>) -> Self {
        Self { message, origin }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
