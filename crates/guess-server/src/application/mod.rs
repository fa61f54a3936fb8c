//! Application layer use cases for the server.
//!
//! Use cases here orchestrate the domain types from `guess_core` and reach
//! the network only through the [`run_experiment::Outbox`] trait, so they run
//! unchanged against a mock in unit tests.
//!
//! - **`run_experiment`** – Starts and finishes experiments, judges incoming
//!   guesses and keeps the leaderboard.

pub mod run_experiment;
