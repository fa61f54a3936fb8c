//! ExperimentHost: runs guessing experiments against every connected player.
//!
//! The host holds at most one active [`Experiment`].  Starting one broadcasts
//! a `Broadcast` signal; each `Response(guess)` that arrives while it is
//! active is judged and answered on the connection it came from.  Exact
//! guesses score a point on the [`Leaderboard`], which survives across
//! experiments.

use guess_core::{ConnectionId, Envelope, Experiment, Leaderboard, MessageKind, Verdict, WireMessage};
use tracing::{debug, info};

/// Outbound side of the server as seen by the use case.
///
/// Implemented by `guess_net::ServerEndpoint`; unit tests use a mock.
#[cfg_attr(test, mockall::automock)]
pub trait Outbox {
    /// Queues `message` on one connection.  Returns `false` if it is gone.
    fn send_to(&self, id: ConnectionId, message: WireMessage) -> bool;

    /// Queues `message` on every live connection and returns how many.
    fn broadcast(&self, message: WireMessage) -> usize;
}

/// Drives experiments and keeps score.
#[derive(Debug, Default)]
pub struct ExperimentHost {
    current: Option<Experiment>,
    leaderboard: Leaderboard,
}

impl ExperimentHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<Experiment> {
        self.current
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    /// Begins an experiment with secret `target` and announces it to every
    /// player.  A running experiment is replaced.
    ///
    /// Returns the number of players the announcement was queued for.
    pub fn start(&mut self, target: i64, outbox: &dyn Outbox) -> usize {
        if self.current.is_some() {
            info!("replacing the running experiment");
        }
        self.current = Some(Experiment::new(target));
        let players = outbox.broadcast(WireMessage::signal(MessageKind::Broadcast));
        info!("experiment started, announced to {players} player(s)");
        players
    }

    /// Ends the running experiment and tells every player.
    ///
    /// Returns `false` (and sends nothing) when no experiment is running.
    pub fn finish(&mut self, outbox: &dyn Outbox) -> bool {
        if self.current.take().is_none() {
            return false;
        }
        let players = outbox.broadcast(WireMessage::signal(MessageKind::Finish));
        info!("experiment finished, notified {players} player(s)");
        true
    }

    /// Judges one inbound envelope.
    ///
    /// Only `Response` messages with a known origin, received while an
    /// experiment is running, get a reply; everything else is ignored.
    pub fn on_message(&mut self, envelope: Envelope, outbox: &dyn Outbox) -> Option<Verdict> {
        let Some(origin) = envelope.origin else {
            debug!("ignoring {} without origin", envelope.message);
            return None;
        };
        if envelope.message.kind() != MessageKind::Response {
            debug!("ignoring {} from {origin}", envelope.message);
            return None;
        }
        let Some(experiment) = self.current else {
            debug!("ignoring guess from {origin}: no experiment running");
            return None;
        };

        let guess = envelope.message.value();
        let verdict = experiment.judge(guess);
        if verdict == Verdict::Equals {
            let wins = self.leaderboard.record_win(origin);
            info!("{origin} guessed the target ({wins} win(s) so far)");
        } else {
            debug!("{origin} guessed {guess}: {verdict:?}");
        }
        if !outbox.send_to(origin, verdict.to_message()) {
            debug!("{origin} left before its verdict could be sent");
        }
        Some(verdict)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
