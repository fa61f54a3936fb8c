//! # guess-core
//!
//! Shared library for Guess-Wire containing the wire message codec, the
//! concurrent FIFO queue used on both sides of every connection, and the
//! number-guessing game rules.
//!
//! This crate is used by the transport, server, and client crates.
//! It has no dependency on sockets or on an async runtime.
//!
//! - **`protocol`** – The fixed 12-byte record that travels over TCP, and the
//!   inbound envelope that tags a decoded record with its origin connection.
//!
//! - **`queue`** – [`ConcurrentQueue`], a mutex-protected deque with a
//!   blocking wait-for-non-empty.
//!
//! - **`domain`** – The experiment (secret target number and verdicts) and the
//!   leaderboard of correct guesses per connection.

pub mod domain;
pub mod protocol;
pub mod queue;

pub use domain::experiment::{Experiment, Leaderboard, Verdict};
pub use protocol::codec::{decode_message, encode_message, ProtocolError};
pub use protocol::messages::{ConnectionId, Envelope, MessageKind, WireMessage, WIRE_MESSAGE_SIZE};
pub use queue::ConcurrentQueue;
