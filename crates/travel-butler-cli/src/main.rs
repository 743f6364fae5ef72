//! Travel Butler CLI
//!
//! Chat with the trip-planning assistant and poke its endpoints from the
//! terminal.

mod api;
mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use dialoguer::Input;

use travel_butler_server::adapters::McpClient;

use api::ButlerClient;
use config::Config;

#[derive(Parser)]
#[command(name = "butler")]
#[command(about = "Travel Butler CLI - AI 智能出行管家", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or change configuration
    Config {
        /// Server base URL (e.g. http://127.0.0.1:8000)
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Check the server is up
    Health,

    /// Start a chat session and remember it
    Start,

    /// Interactive chat (type `exit` or `quit` to leave)
    Chat {
        /// Session id (defaults to the last one started)
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Send a single message
    Send {
        message: String,
        /// Session id (defaults to the last one started)
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Compare trains and flights for one leg
    Transport {
        from: String,
        to: String,
        /// YYYY-MM-DD
        date: String,
        /// train or flight (repeatable; both when omitted)
        #[arg(short, long = "mode")]
        modes: Vec<String>,
    },

    /// Web search through the server
    Search {
        query: String,
        /// Max results
        #[arg(short, long)]
        max: Option<usize>,
    },

    /// Transit side-process checks
    Transit {
        #[command(subcommand)]
        action: TransitAction,
    },
}

#[derive(Subcommand)]
enum TransitAction {
    /// List tools on an MCP endpoint (exit 1 when unreachable)
    Ping {
        /// Endpoint, e.g. http://127.0.0.1:8080/mcp
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Config { base_url } => cmd_config(base_url),
        Commands::Health => cmd_health().await,
        Commands::Start => cmd_start().await,
        Commands::Chat { session } => cmd_chat(session).await,
        Commands::Send { message, session } => cmd_send(message, session).await,
        Commands::Transport {
            from,
            to,
            date,
            modes,
        } => cmd_transport(from, to, date, modes).await,
        Commands::Search { query, max } => cmd_search(query, max).await,
        Commands::Transit { action } => match action {
            TransitAction::Ping { url } => cmd_transit_ping(url).await,
        },
    }
}

// ============================================
// Command Implementations
// ============================================

fn cmd_config(base_url: Option<String>) -> Result<()> {
    let mut config = Config::load()?;

    if let Some(url) = base_url {
        config.set_base_url(&url);
        config.save()?;
        println!("{} Base URL set to {}", "✓".green(), config.base_url);
    }

    println!("{}", "Configuration:".bold());
    println!("  Path: {:?}", Config::config_path()?);
    println!("  Base URL: {}", config.base_url);
    println!(
        "  Last session: {}",
        config.last_session.as_deref().unwrap_or("None").cyan()
    );

    Ok(())
}

async fn cmd_health() -> Result<()> {
    let config = Config::load()?;
    let client = ButlerClient::new(&config.base_url);

    let health = client.health().await?;
    println!(
        "{} {} ({}) v{}",
        "✓".green(),
        health.message,
        health.status.green(),
        health.version
    );
    Ok(())
}

async fn start_session(client: &ButlerClient, config: &mut Config) -> Result<String> {
    let session_id = client.start_chat().await?;
    config.last_session = Some(session_id.clone());
    config.save()?;
    Ok(session_id)
}

/// Save a replacement for an expired session
fn remember_session(config: &mut Config, session_id: &str) -> Result<()> {
    eprintln!(
        "{} Session expired, continuing in {}",
        "!".yellow(),
        session_id.cyan()
    );
    config.last_session = Some(session_id.to_string());
    config.save()
}

async fn cmd_start() -> Result<()> {
    let mut config = Config::load()?;
    let client = ButlerClient::new(&config.base_url);

    let session_id = start_session(&client, &mut config).await?;
    println!("{} Session started: {}", "✓".green(), session_id.cyan());
    Ok(())
}

async fn cmd_chat(session: Option<String>) -> Result<()> {
    let mut config = Config::load()?;
    let client = ButlerClient::new(&config.base_url);

    let mut session_id = match config.session(session.as_deref()) {
        Some(id) => id,
        None => start_session(&client, &mut config).await?,
    };
    println!("{} {}", "Session:".dimmed(), session_id.cyan());
    println!("{}", "Type `exit` or `quit` to leave.".dimmed());

    loop {
        let line: String = Input::new()
            .with_prompt("你")
            .allow_empty(true)
            .interact_text()
            .context("Failed to read input")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }

        match client.send_or_restart(&session_id, line).await {
            Ok((reply, fresh)) => {
                if let Some(fresh) = fresh {
                    remember_session(&mut config, &fresh)?;
                    session_id = fresh;
                }
                println!("{} {}\n", "管家:".green().bold(), reply.reply);
            }
            Err(e) => eprintln!("{} {}", "✗".red(), e),
        }
    }

    Ok(())
}

async fn cmd_send(message: String, session: Option<String>) -> Result<()> {
    let mut config = Config::load()?;
    let client = ButlerClient::new(&config.base_url);

    let session_id = match config.session(session.as_deref()) {
        Some(id) => id,
        None => start_session(&client, &mut config).await?,
    };

    let (reply, fresh) = client.send_or_restart(&session_id, &message).await?;
    if let Some(fresh) = fresh {
        remember_session(&mut config, &fresh)?;
    }
    println!("{}", reply.reply);
    if !reply.profile.is_null() {
        eprintln!("{} {}", "profile:".dimmed(), reply.profile.to_string().dimmed());
    }
    Ok(())
}

async fn cmd_transport(from: String, to: String, date: String, modes: Vec<String>) -> Result<()> {
    let config = Config::load()?;
    let client = ButlerClient::new(&config.base_url);

    let resp = client.compare_transport(&from, &to, &date, modes).await?;
    println!("{} {} → {} ({})", "Transport:".bold(), from.cyan(), to.cyan(), date);

    if let Some(options) = resp.data["options"].as_object() {
        for (mode, result) in options {
            let status = if result["ok"].as_bool().unwrap_or(false) {
                format!("{} rows", result["rows"]).green()
            } else {
                result["error"]["message"]
                    .as_str()
                    .unwrap_or("failed")
                    .to_string()
                    .red()
            };
            println!("  {} {}", mode.bold(), status);
        }
    }
    println!();
    println!("{}", resp.data["analysis_text"].as_str().unwrap_or(""));
    Ok(())
}

async fn cmd_search(query: String, max: Option<usize>) -> Result<()> {
    let config = Config::load()?;
    let client = ButlerClient::new(&config.base_url);

    let resp = client.search(&query, max).await?;
    if let Some(answer) = &resp.answer {
        println!("{}\n", answer);
    }
    println!("{} results for '{}':", resp.results.len().to_string().green(), resp.query);
    for hit in resp.results {
        println!("  {} {}", hit.title.cyan(), hit.url.dimmed());
        if !hit.snippet.is_empty() {
            println!("    {}", truncate_string(&hit.snippet, 80));
        }
    }
    Ok(())
}

async fn cmd_transit_ping(url: String) -> Result<()> {
    let client = McpClient::new("transit", Some(url.clone()));

    match client.list_tools().await {
        Ok(tools) => {
            println!("{} {} reachable, {} tools", "✓".green(), url, tools.len());
            for tool in tools {
                if let Some(name) = tool["name"].as_str() {
                    println!("  {}", name.cyan());
                }
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", "✗".red(), e);
            std::process::exit(1);
        }
    }
}

/// Truncate string safely for UTF-8 (by char count, not bytes)
fn truncate_string(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        format!("{}...", s.chars().take(max_chars).collect::<String>())
    } else {
        s.to_string()
    }
}
