//! bloo - Command-line client for the Bloocoin ledger server
//!
//! One-shot commands; every command opens its own connection.

mod commands;
mod config;

use bloocoin_client::{Client, StampStore};
use clap::{Parser, Subcommand};
use colored::Colorize;
use config::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bloo")]
#[command(about = "Command-line client for the Bloocoin ledger server")]
#[command(version)]
struct Cli {
    /// Path to a YAML config file
    #[arg(short, long, env = "BLOOCOIN_CONFIG")]
    config: Option<PathBuf>,

    /// Server address (host:port)
    #[arg(short, long)]
    server: Option<String>,

    /// Directory holding the bloostamp file
    #[arg(long)]
    stamp_dir: Option<PathBuf>,

    /// Per-read timeout in milliseconds
    #[arg(long)]
    read_timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check whether the server accepts connections
    Online,

    /// Register an address with the server
    Register {
        /// Generate a new bloostamp and save it after a successful registration
        #[arg(short, long, conflicts_with_all = ["addr", "pwd"])]
        generate: bool,

        /// Address to register (defaults to the stored bloostamp)
        #[arg(requires = "pwd")]
        addr: Option<String>,

        /// Password for the address
        pwd: Option<String>,
    },

    /// Show or create the local bloostamp
    Stamp {
        #[command(subcommand)]
        action: StampAction,
    },

    /// Get the current mining difficulty
    Difficulty,

    /// Get the balance of the stored address
    Balance,

    /// Send coins from the stored address
    Send {
        /// Receiving address
        to: String,

        /// Number of coins
        amount: i64,
    },

    /// Submit a mined string for the stored address
    Check {
        /// The winning string
        winning_string: String,

        /// Its SHA-512 hash (computed locally when omitted)
        #[arg(long)]
        hash: Option<String>,
    },

    /// List transactions of the stored address
    Transactions,

    /// Get the number of coins in circulation
    Total,

    /// Get the balance of any address
    CheckAddr {
        /// Address to look up
        addr: String,
    },

    /// List the commands the server understands
    ListCommands,

    /// Send a catalog command with JSON arguments and print the raw reply
    Raw {
        /// Command name, e.g. check_addr
        command: String,

        /// Arguments as a JSON object
        #[arg(default_value = "{}")]
        args: String,
    },
}

#[derive(Subcommand)]
pub enum StampAction {
    /// Print the stored bloostamp
    Show,

    /// Generate and store a new bloostamp without registering it
    Generate {
        /// Overwrite an existing bloostamp
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).map_err(|e| {
        tracing::error!("Failed to load config: {}", e);
        e
    })?;
    if let Some(server) = cli.server {
        config.server = server;
    }
    if let Some(dir) = cli.stamp_dir {
        config.stamp_dir = Some(dir);
    }
    if let Some(ms) = cli.read_timeout_ms {
        config.read_timeout_ms = ms;
    }

    let store = match config.stamp_dir.clone() {
        Some(dir) => StampStore::new(dir),
        None => StampStore::default_location()?,
    };

    let mut client = Client::new(config.client_config()?);
    if store.exists() {
        match store.read() {
            Ok(stamp) => client.set_credentials(stamp.credentials()),
            Err(e) => tracing::warn!("Ignoring unreadable bloostamp: {}", e),
        }
    }

    match commands::execute(&client, &store, cli.command).await {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            std::process::exit(1);
        }
    }

    Ok(())
}
