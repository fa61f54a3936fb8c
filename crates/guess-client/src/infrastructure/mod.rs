//! Infrastructure layer for the player: the interactive console.

pub mod console;
