//! Player: the client-side half of an experiment.
//!
//! The player does no I/O.  [`Player::on_message`] maps each server signal to
//! a [`Reaction`] the console renders, and [`Player::guess`] records a number
//! and produces the `Response` to send.

use guess_core::{MessageKind, WireMessage};
use tracing::debug;

/// What the console should do after a server message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    /// A new experiment was announced.
    NewExperiment,
    /// The last guess was above the target.
    TooHigh,
    /// The last guess was below the target.
    TooLow,
    /// The last guess hit the target.
    Correct,
    /// The experiment ended.
    Finished,
    /// Nothing for the player to act on.
    Ignored,
}

impl Reaction {
    /// Whether the player should be asked for another number.
    pub fn wants_guess(self) -> bool {
        matches!(self, Reaction::NewExperiment | Reaction::TooHigh | Reaction::TooLow)
    }

    /// Line shown to the player, if any.
    pub fn notice(self) -> Option<&'static str> {
        match self {
            Reaction::NewExperiment => Some("A new experiment has started."),
            Reaction::TooHigh => Some("Too high."),
            Reaction::TooLow => Some("Too low."),
            Reaction::Correct => Some("Correct! You guessed the number."),
            Reaction::Finished => Some("The experiment has finished."),
            Reaction::Ignored => None,
        }
    }
}

/// Guess history for the current experiment.
#[derive(Debug, Default)]
pub struct Player {
    history: Vec<i64>,
}

impl Player {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reacts to one message from the server.
    pub fn on_message(&mut self, message: WireMessage) -> Reaction {
        match message.kind() {
            MessageKind::Broadcast => Reaction::NewExperiment,
            MessageKind::Greater => Reaction::TooHigh,
            MessageKind::Less => Reaction::TooLow,
            MessageKind::Equals => Reaction::Correct,
            MessageKind::Finish => {
                self.history.clear();
                Reaction::Finished
            }
            MessageKind::Response => {
                debug!("ignoring {message} from server");
                Reaction::Ignored
            }
        }
    }

    /// Records `value` and returns the message carrying it.
    pub fn guess(&mut self, value: i64) -> WireMessage {
        self.history.push(value);
        WireMessage::new(MessageKind::Response, value)
    }

    /// Numbers guessed so far, oldest first.
    pub fn history(&self) -> &[i64] {
        &self.history
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
