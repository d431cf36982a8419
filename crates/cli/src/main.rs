//! Confidant CLI: the main entry point.
//!
//! Commands:
//! - `chat`:     Interactive terminal chat or single-message mode
//! - `serve`:    Start the web chat page and HTTP API
//! - `status`:   Show configuration and model status
//! - `onboard`:  Write the default config and knowledge folder

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "confidant",
    about = "Confidant — your private, knowledge-aware AI assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.confidant/config.toml)
    #[arg(short, long, global = true, env = "CONFIDANT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the assistant in the terminal
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Load the AI engine before the first message
        #[arg(long)]
        load: bool,
    },

    /// Start the web chat page and HTTP API
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,

        /// Start loading the AI engine immediately
        #[arg(long)]
        load: bool,
    },

    /// Show configuration and model status
    Status,

    /// Write the default configuration and knowledge folder
    Onboard,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Chat { message, load } => commands::chat::run(config_path, message, load).await?,
        Commands::Serve { port, load } => commands::serve::run(config_path, port, load).await?,
        Commands::Status => commands::status::run(config_path).await?,
        Commands::Onboard => commands::onboard::run(config_path).await?,
    }

    Ok(())
}
