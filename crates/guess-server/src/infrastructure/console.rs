//! Operator console: parses the commands typed on the server's stdin.
//!
//! | Input        | Command                         |
//! |--------------|---------------------------------|
//! | `start <n>`  | begin an experiment with target `n` |
//! | `finish`     | end the running experiment      |
//! | `leaders`    | print the leaderboard           |
//! | `help`       | list the commands               |
//! | `quit`       | stop the server                 |
//!
//! Lines are read on a plain background thread and handed to the main loop
//! over a channel, so the main loop can keep draining network traffic while
//! the operator is idle.

use std::io::BufRead;
use std::num::ParseIntError;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use guess_core::Leaderboard;
use thiserror::Error;
use tracing::warn;

/// One parsed console command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start(i64),
    Finish,
    Leaders,
    Help,
    Quit,
}

/// Error type for console input that is not a valid command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command `{0}` (type `help`)")]
    Unknown(String),
    #[error("`start` needs a target number")]
    MissingTarget,
    #[error("`{input}` is not a valid target: {source}")]
    InvalidTarget {
        input: String,
        #[source]
        source: ParseIntError,
    },
}

pub const HELP: &str = "\
commands:
  start <n>   begin an experiment with secret target n
  finish      end the running experiment
  leaders     show correct guesses per connection
  help        show this list
  quit        stop the server";

/// Parses one console line.  Surrounding whitespace and keyword case are
/// ignored.
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let mut words = line.split_whitespace();
    let Some(keyword) = words.next() else {
        return Err(CommandError::Empty);
    };

    match keyword.to_ascii_lowercase().as_str() {
        "start" => {
            let input = words.next().ok_or(CommandError::MissingTarget)?;
            let target = input.parse().map_err(|source| CommandError::InvalidTarget {
                input: input.to_string(),
                source,
            })?;
            Ok(Command::Start(target))
        }
        "finish" => Ok(Command::Finish),
        "leaders" => Ok(Command::Leaders),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

/// Formats the leaderboard as one `#id  wins` line per connection.
pub fn render_leaderboard(board: &Leaderboard) -> String {
    if board.is_empty() {
        return "no correct guesses yet".to_string();
    }
    board
        .standings()
        .map(|(id, wins)| format!("{:>6}  {wins}", id.to_string()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reads lines from `input` on a background thread.
///
/// The receiver disconnects when the input reaches end-of-file or fails.
pub fn spawn_line_reader<R>(input: R) -> std::io::Result<Receiver<String>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("guess-console".to_string())
        .spawn(move || {
            for line in input.lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("console read failed: {e}");
                        break;
                    }
                }
            }
        })?;
    Ok(rx)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
