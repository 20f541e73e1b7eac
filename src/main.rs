use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod api;
mod app;
mod config;
mod elements;
mod handler;
mod state;
mod tui;
mod ui;
mod utils;

use api::{ApiClient, ChatApi};
use app::App;
use config::Config;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "convai")]
#[command(about = "Terminal chat client for the Conversational AI Platform")]
#[command(version)]
struct Cli {
    /// Backend base URL, overriding the config file
    #[arg(short, long, global = true)]
    base_url: Option<String>,

    /// Config file to use instead of the default location
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Where to write logs (the terminal belongs to the UI)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive chat (default)
    Chat,
    /// Send a single message and print the reply
    Send {
        /// Message text
        message: String,
    },
    /// Query the backend health endpoint
    Health,
    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = cli
        .log_file
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("convai.log"));
    init_logging(&log_path)?;

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::get_config_path()?,
    };
    let mut config = Config::load_from(&config_path)?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => run_chat(&config).await?,
        Commands::Send { message } => send_once(&config, &message).await?,
        Commands::Health => check_health(&config).await?,
        Commands::Init { force } => init_config(&config_path, force)?,
    }

    Ok(())
}

fn init_logging(path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating log file {}", path.display()))?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("convai=info"));

    tracing_subscriber::fmt()
        .with_writer(std::sync::Mutex::new(file))
        .with_env_filter(filter)
        .with_ansi(false)
        .init();
    Ok(())
}

async fn run_chat(config: &Config) -> Result<()> {
    let api: Arc<dyn ChatApi> = Arc::new(ApiClient::new(config));

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let mut app = App::new(config, api, events.sender());
    app.check_api_health();
    info!(endpoint = %config.chat_url(), "chat client initialized");

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    let history = app.state.history();
    info!(
        messages = history.len(),
        errors = history.iter().filter(|m| m.is_error).count(),
        "chat session ended"
    );

    tui::restore()?;
    result
}

async fn run_loop(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }
    }
    Ok(())
}

async fn send_once(config: &Config, message: &str) -> Result<()> {
    let message = message.trim();
    if message.is_empty() {
        bail!("message is empty");
    }

    let client = ApiClient::new(config);
    match client.send_message(message).await {
        Ok(reply) => {
            println!("{} {}", "You:".bold().cyan(), message);
            println!("{} {}", "Bot:".bold().yellow(), reply.response);
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "one-shot send failed");
            eprintln!("{}: {}", config.error_message.red(), e);
            eprintln!("Is the backend running at {}?", config.base_url.bold());
            Err(anyhow::Error::new(e).context("sending message"))
        }
    }
}

async fn check_health(config: &Config) -> Result<()> {
    let client = ApiClient::new(config);

    match client.check_health().await {
        Ok(health) => {
            println!("{}", "API status".bold().green());
            println!("{}", serde_json::to_string_pretty(&health)?);
            Ok(())
        }
        Err(e) => {
            eprintln!("{}: {}", "Health check failed".red(), e);
            eprintln!("Is the backend running at {}?", config.base_url.bold());
            Err(anyhow::Error::new(e).context("checking backend health"))
        }
    }
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    Config::default().save_to(path)?;
    println!("Wrote default config to {}", path.display().to_string().bold());
    Ok(())
}
