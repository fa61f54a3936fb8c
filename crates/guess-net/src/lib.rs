//! # guess-net
//!
//! TCP transport for Guess-Wire.
//!
//! Both endpoints own a single-threaded Tokio runtime that is driven on a
//! dedicated OS thread.  Application code stays synchronous: it calls
//! `send`, `broadcast` or `send_to`, and waits on the endpoint's inbound
//! [`ConcurrentQueue`](guess_core::ConcurrentQueue).
//!
//! - **`connection`** – [`Connection`], one framed byte stream with an
//!   always-armed read loop and an on-demand write loop.
//! - **`server`** – [`ServerEndpoint`], the accept loop and the registry of
//!   live connections.
//! - **`client`** – [`ClientEndpoint`], a single outbound connection.

pub mod client;
pub mod connection;
mod io_thread;
pub mod server;

pub use client::{ClientEndpoint, ClientNetworkError};
pub use connection::{Connection, Role};
pub use server::{MessageHandler, NetworkError, ServerEndpoint};
