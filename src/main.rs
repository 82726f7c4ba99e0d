use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;

mod app;
mod backend;
mod config;
mod handler;
mod transcript;
mod tui;
mod ui;

use app::App;
use backend::BackendClient;
use config::Config;

#[derive(Parser)]
#[command(name = "pdfchat")]
#[command(about = "Chat with a PDF through its question-answering backend")]
struct Cli {
    /// Backend base URL (overrides PDFCHAT_BACKEND and the config file)
    #[arg(short, long, global = true)]
    backend: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a PDF for indexing and print the backend's reply
    Upload {
        /// Path to the PDF
        file: PathBuf,
    },
    /// Ask a single question about the indexed document
    Ask {
        /// Your question
        question: String,
    },
    /// Persist the backend URL to the config file
    SetBackend {
        /// Base URL, e.g. http://127.0.0.1:8000
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().unwrap_or_default();
    let base_url = config::resolve_backend_url(
        cli.backend.as_deref(),
        std::env::var(config::BACKEND_ENV_VAR).ok(),
        &config,
    );
    let backend = BackendClient::new(&base_url);

    match cli.command {
        Some(Commands::Upload { file }) => {
            env_logger::init();
            upload_once(&backend, &file).await
        }
        Some(Commands::Ask { question }) => {
            env_logger::init();
            ask_once(&backend, &question).await
        }
        Some(Commands::SetBackend { url }) => set_backend(config, url),
        // The TUI owns the terminal, so no logger there
        None => run_tui(App::new(backend)).await,
    }
}

async fn run_tui(mut app: App) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new(Duration::from_millis(250));

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        if let Some(event) = events.next().await {
            handler::handle_event(&mut app, event)?;
        }

        app.poll_requests().await;
    }

    app.abort_requests();
    tui::restore()?;
    Ok(())
}

async fn upload_once(backend: &BackendClient, file: &Path) -> Result<()> {
    println!("📤 Uploading {}…", file.display().to_string().bold());

    let reply = backend.upload(file).await?;

    if let Some(error) = reply.error {
        println!("{} {}", "❌".red(), error);
        std::process::exit(1);
    }

    println!("{}", reply.message.unwrap_or_default().green());
    Ok(())
}

async fn ask_once(backend: &BackendClient, question: &str) -> Result<()> {
    println!("{} {}", "Q:".bold().cyan(), question);

    let reply = backend.ask(question).await?;

    match reply.answer {
        Some(answer) => println!("{} {}", "A:".bold().green(), answer),
        None => {
            println!("{} {}", "❌".red(), reply.error.unwrap_or_default());
            std::process::exit(1);
        }
    }

    Ok(())
}

fn set_backend(mut config: Config, url: String) -> Result<()> {
    config.backend_url = Some(url.clone());
    config.save()?;
    println!("Backend set to {}", url.bold());
    Ok(())
}
