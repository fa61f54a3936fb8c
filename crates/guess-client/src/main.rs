//! Guess-Wire player entry point.
//!
//! Connects to a server, then reacts to each signal it sends: announcements
//! and hints prompt for a number on stdin, which is sent back as a guess.
//!
//! ```text
//! guess-client [--host <HOST>] [--port <PORT>]
//! ```
//!
//! The player exits when the server closes the connection or stdin ends.

use std::io::{self, Write};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use guess_client::application::play::Player;
use guess_client::infrastructure::console::prompt_guess;
use guess_net::ClientEndpoint;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Guess-Wire player.
#[derive(Debug, Parser)]
#[command(name = "guess-client", about = "Joins a Guess-Wire server and plays", version)]
struct Cli {
    /// Server host name or IP address.
    #[arg(long, default_value = "127.0.0.1", env = "GUESS_HOST")]
    host: String,

    /// Server TCP port.
    #[arg(long, default_value_t = 60000, env = "GUESS_PORT")]
    port: u16,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut client = ClientEndpoint::new();
    client
        .connect(&cli.host, cli.port)
        .with_context(|| format!("failed to connect to {}:{}", cli.host, cli.port))?;
    println!("Connected. Waiting for the next experiment...");

    let mut player = Player::new();
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    loop {
        if !client.inbound().wait_timeout(POLL_INTERVAL) {
            if client.is_connected() {
                continue;
            }
            info!("server closed the connection");
            break;
        }
        let Some(envelope) = client.inbound().pop_front() else {
            continue;
        };

        let reaction = player.on_message(envelope.message);
        if let Some(notice) = reaction.notice() {
            writeln!(output, "{notice}")?;
        }
        if !reaction.wants_guess() {
            continue;
        }

        let Some(value) = prompt_guess(&mut input, &mut output, player.history())? else {
            info!("input closed");
            break;
        };
        let message = player.guess(value);
        if client.send(message).is_err() {
            info!("server closed the connection");
            break;
        }
    }

    client.disconnect();
    Ok(())
}
