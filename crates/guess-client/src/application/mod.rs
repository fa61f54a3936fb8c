//! Application layer for the player.
//!
//! - **`play`** – Turns server signals into reactions for the console and
//!   turns the player's numbers into `Response` messages.

pub mod play;
