//! Guess-Wire server entry point.
//!
//! Starts the TCP endpoint, then multiplexes two inputs on the main thread:
//! guesses arriving from players (judged by the [`ExperimentHost`]) and
//! operator commands typed on stdin.
//!
//! # Usage
//!
//! ```text
//! guess-server [OPTIONS]
//!
//! Options:
//!   --config <PATH>   TOML config file [default: platform config dir]
//!   --port   <PORT>   TCP port to listen on            (env: GUESS_PORT)
//!   --bind   <ADDR>   IP address to bind               (env: GUESS_BIND)
//!   --write-config    write the effective config file and exit
//! ```
//!
//! Command-line values override the config file.  The log level comes from
//! `RUST_LOG` when set, else from `[server] log_level`.

use std::io::BufReader;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::mpsc::TryRecvError;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use guess_net::ServerEndpoint;
use guess_server::application::run_experiment::ExperimentHost;
use guess_server::infrastructure::console::{
    parse_command, render_leaderboard, spawn_line_reader, Command, HELP,
};
use guess_server::infrastructure::storage::config::{
    config_file_path, load_config, save_config_to, AppConfig,
};

/// How long the main loop waits for network traffic before checking the
/// console again.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Guess-Wire experiment host.
#[derive(Debug, Parser)]
#[command(
    name = "guess-server",
    about = "Runs number-guessing experiments for connected players",
    version
)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// TCP port to listen on.  Overrides `[network] port`.
    #[arg(long, env = "GUESS_PORT")]
    port: Option<u16>,

    /// IP address to bind.  Overrides `[network] bind_address`.
    #[arg(long, env = "GUESS_BIND")]
    bind: Option<String>,

    /// Write the effective configuration to the config file and exit.
    #[arg(long)]
    write_config: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(port) = self.port {
            config.network.port = port;
        }
        if let Some(bind) = &self.bind {
            config.network.bind_address = bind.clone();
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref()).context("failed to load configuration")?;
    cli.apply_overrides(&mut config);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    if cli.write_config {
        let path = match cli.config {
            Some(path) => path,
            None => config_file_path()?,
        };
        save_config_to(&path, &config)
            .with_context(|| format!("failed to write config to {}", path.display()))?;
        info!("configuration written to {}", path.display());
        return Ok(());
    }

    let addr = config.listen_addr()?;
    let mut server = ServerEndpoint::new();
    server
        .start_on(addr)
        .with_context(|| format!("failed to start server on {addr}"))?;

    println!("{HELP}");
    let commands =
        spawn_line_reader(BufReader::new(std::io::stdin())).context("failed to read stdin")?;
    let mut host = ExperimentHost::new();

    'main: loop {
        server.inbound().wait_timeout(POLL_INTERVAL);
        server.drain_inbound(None, &mut host);

        loop {
            match commands.try_recv() {
                Ok(line) => {
                    if run_command(&line, &mut host, &server).is_break() {
                        break 'main;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    info!("console input closed");
                    break 'main;
                }
            }
        }
    }

    server.stop();
    Ok(())
}

fn run_command(line: &str, host: &mut ExperimentHost, server: &ServerEndpoint) -> ControlFlow<()> {
    let command = match parse_command(line) {
        Ok(command) => command,
        Err(e) => {
            warn!("{e}");
            return ControlFlow::Continue(());
        }
    };

    match command {
        Command::Start(target) => {
            let players = host.start(target, server);
            println!("experiment started for {players} player(s)");
        }
        Command::Finish => {
            if !host.finish(server) {
                println!("no experiment is running");
            }
        }
        Command::Leaders => println!("{}", render_leaderboard(host.leaderboard())),
        Command::Help => println!("{HELP}"),
        Command::Quit => return ControlFlow::Break(()),
    }
    ControlFlow::Continue(())
}
