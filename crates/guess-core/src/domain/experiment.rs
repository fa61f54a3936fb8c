//! Experiment rules and the per-connection leaderboard.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::protocol::messages::{ConnectionId, MessageKind, WireMessage};

/// The answer to one guess, from the guesser's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The guess was below the target.
    Less,
    /// The guess hit the target.
    Equals,
    /// The guess was above the target.
    Greater,
}

impl Verdict {
    pub fn message_kind(self) -> MessageKind {
        match self {
            Verdict::Less => MessageKind::Less,
            Verdict::Equals => MessageKind::Equals,
            Verdict::Greater => MessageKind::Greater,
        }
    }

    /// The reply sent back to the guesser.
    pub fn to_message(self) -> WireMessage {
        WireMessage::signal(self.message_kind())
    }
}

/// One round of the guessing game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Experiment {
    target: i64,
}

impl Experiment {
    pub fn new(target: i64) -> Self {
        Self { target }
    }

    pub fn target(&self) -> i64 {
        self.target
    }

    /// Compares `guess` against the secret target.
    pub fn judge(&self, guess: i64) -> Verdict {
        match guess.cmp(&self.target) {
            Ordering::Less => Verdict::Less,
            Ordering::Equal => Verdict::Equals,
            Ordering::Greater => Verdict::Greater,
        }
    }
}

/// Number of correct guesses per connection, ordered by connection id.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Leaderboard {
    wins: BTreeMap<ConnectionId, u32>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one win for `id` and returns its new total.
    pub fn record_win(&mut self, id: ConnectionId) -> u32 {
        let wins = self.wins.entry(id).or_insert(0);
        *wins = wins.saturating_add(1);
        *wins
    }

    pub fn wins(&self, id: ConnectionId) -> u32 {
        self.wins.get(&id).copied().unwrap_or(0)
    }

    /// All entries in ascending connection-id order.
    pub fn standings(&self) -> impl Iterator<Item = (ConnectionId, u32)> + '_ {
        self.wins.iter().map(|(id, wins)| (*id, *wins))
    }

    pub fn is_empty(&self) -> bool {
        self.wins.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
