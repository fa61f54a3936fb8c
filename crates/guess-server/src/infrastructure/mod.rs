//! Infrastructure layer for the server.
//!
//! Adapters between the application layer and the outside world: the
//! network endpoint, the operator console, and configuration storage.
//!
//! **Dependency rule**: this layer may depend on `application`, `guess_core`
//! and `guess_net`, but MUST NOT be imported by the `application` layer.

pub mod console;
pub mod network;
pub mod storage;
