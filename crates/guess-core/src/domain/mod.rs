//! Domain layer: pure game rules with no I/O.
//!
//! An *experiment* is one round of the guessing game.  The server picks a
//! secret target, every connected player guesses, and each guess is answered
//! with a [`experiment::Verdict`].  Correct guesses are counted per connection
//! on the [`experiment::Leaderboard`].

pub mod experiment;
