use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::style::Stylize;
use tracing_subscriber::EnvFilter;

use luma_chat::markup;
use luma_chat::{ChatClient, Config, HttpReplyService, Role, SubmitOutcome, TranscriptView, Variant};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "luma")]
#[command(about = "Chat with the Luma recommendation endpoint from the terminal")]
struct Cli {
    /// Server the reply endpoint lives on (requests go to its root path)
    #[arg(short, long, env = "LUMA_SERVER")]
    server: Option<String>,
    /// Deployment profile: which reply fields to read and how to show waits and failures
    #[arg(short, long, value_enum)]
    variant: Option<Variant>,
    /// Config file to use instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one message and print the resulting conversation
    Ask {
        /// Your message
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_else(|err| {
            // Logging is not set up yet; the log path comes from this config.
            eprintln!("warning: {:#}; using default settings", err);
            Config::new()
        }),
    };

    let server = cli.server.clone().unwrap_or_else(|| config.server().to_string());
    let variant = cli.variant.unwrap_or_else(|| config.variant());

    let mut client = ChatClient::new(variant);
    if let Some(text) = &config.placeholder_text {
        client = client.with_placeholder_text(text.clone());
    }
    let service = HttpReplyService::new(&server);

    match cli.command {
        Some(Commands::Ask { message }) => {
            init_stderr_logging();
            ask(&client, &service, message).await
        }
        None => {
            init_file_logging(&config)?;
            tracing::info!(%server, variant = variant.as_str(), "starting chat");
            run_tui(client, service).await
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("luma=info,luma_chat=info"))
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// The TUI owns the terminal, so logs go to a file.
fn init_file_logging(config: &Config) -> Result<()> {
    let path = config.log_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Could not open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

async fn ask(client: &ChatClient, service: &HttpReplyService, mut message: String) -> Result<()> {
    let mut transcript = TranscriptView::new();
    let outcome = client.submit(&mut transcript, &mut message, service).await;

    if outcome == SubmitOutcome::Ignored {
        println!("{}", "Nothing to send".dark_grey());
        return Ok(());
    }

    for msg in transcript.messages() {
        let label = match msg.role {
            Role::Human => "You:".bold().cyan(),
            Role::Ai => "AI:".bold().yellow(),
        };
        println!("{}", label);
        println!("{}\n", markup::plain_text(&msg.text));
    }

    if let SubmitOutcome::Rendered { ai_bubbles: 0 } = outcome {
        tracing::info!("reply carried no fields for the {} variant", client.variant().as_str());
    }

    Ok(())
}

async fn run_tui(client: ChatClient, service: HttpReplyService) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut events = EventHandler::new();
    let mut app = App::new(client, service, events.sender());

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;

            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event)?,
                None => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    result
}
