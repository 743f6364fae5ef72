//! Travel Butler API server binary
//!
//! - `serve` runs the HTTP API (default)
//! - `dev` restarts `serve` on source changes

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use travel_butler_server::config::{self, Settings};
use travel_butler_server::{dev_reload, logging};

#[derive(Parser)]
#[command(name = "travel-butler-server")]
#[command(about = "Travel Butler API server", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve,

    /// Run `serve` and restart it when sources change
    Dev {
        /// Directories to watch (repeatable)
        #[arg(short, long, default_value = "crates")]
        watch: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_env_file();
    logging::init();
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let settings = Settings::from_env().context("invalid configuration")?;
            travel_butler_server::run(settings).await?;
        }
        Commands::Dev { watch } => {
            dev_reload::run(watch).await?;
        }
    }
    Ok(())
}
