use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use counselor_core::{ChatBackend, Config, ConversationController, CounselorClient};

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

#[cfg(test)]
mod test_support;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "eco-counselor", version)]
#[command(about = "Talk through eco-anxiety with an AI counselor from your terminal")]
struct Cli {
    /// Counselor backend address (overrides the config file)
    #[arg(long, env = "COUNSELOR_API_URL")]
    api_url: Option<String>,

    /// Log file for the interactive session
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one message and print the counselor's reply
    Ask {
        /// Your message
        text: String,
    },
    /// Save settings to the config file
    Config {
        /// Backend address to store
        #[arg(long)]
        api_url: Option<String>,
        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Greeting that opens each conversation
        #[arg(long)]
        greeting: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before parsing so COUNSELOR_API_URL can live there
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::load().context("loading config")?;
    let api_url = config.resolve_api_url(cli.api_url.as_deref());

    match cli.command {
        None => run_interactive(&config, api_url, cli.log_file).await,
        Some(Commands::Ask { text }) => {
            logging::init_stderr();
            ask(&config, &api_url, &text).await
        }
        Some(Commands::Config { api_url: stored_url, timeout, greeting }) => {
            configure(config, stored_url, timeout, greeting, cli.api_url.as_deref())
        }
    }
}

fn build_backend(config: &Config, api_url: &str) -> Result<Arc<dyn ChatBackend>> {
    let client = match config.request_timeout() {
        Some(timeout) => CounselorClient::with_timeout(api_url, timeout)
            .context("building HTTP client")?,
        None => CounselorClient::new(api_url),
    };
    Ok(Arc::new(client))
}

async fn run_interactive(config: &Config, api_url: String, log_file: Option<PathBuf>) -> Result<()> {
    let _log_guard = logging::init_file(log_file)?;
    tracing::info!(%api_url, "starting eco-counselor");

    let backend = build_backend(config, &api_url)?;
    let controller = ConversationController::new(config.greeting());
    let mut app = App::new(controller, backend, api_url);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run_loop(&mut terminal, &mut app).await;
    tui::restore()?;

    tracing::info!("exiting eco-counselor");
    result
}

async fn run_loop(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        tokio::select! {
            event = events.next() => match event {
                Some(event) => handler::handle_event(app, event),
                None => break,
            },
            joined = app.wait_in_flight(), if app.has_in_flight() => {
                app.finish_request(joined);
            }
        }
    }

    Ok(())
}

async fn ask(config: &Config, api_url: &str, text: &str) -> Result<()> {
    let backend = build_backend(config, api_url)?;
    let mut controller = ConversationController::new(config.greeting());

    match controller.send(backend.as_ref(), text).await {
        Some(reply) => println!("{}", reply.text),
        None => eprintln!("Nothing to send: the message is blank"),
    }

    Ok(())
}

/// Overwrite the settings that were given, keep the rest
fn apply_config_changes(
    config: &mut Config,
    api_url: Option<String>,
    timeout: Option<u64>,
    greeting: Option<String>,
) {
    if api_url.is_some() {
        config.api_url = api_url;
    }
    if timeout.is_some() {
        config.request_timeout_secs = timeout;
    }
    if greeting.is_some() {
        config.greeting = greeting;
    }
}

fn configure(
    mut config: Config,
    api_url: Option<String>,
    timeout: Option<u64>,
    greeting: Option<String>,
    override_url: Option<&str>,
) -> Result<()> {
    apply_config_changes(&mut config, api_url, timeout, greeting);

    let path = config.save().context("saving config")?;
    println!("Saved {}", path.display());
    println!("api_url: {}", config.resolve_api_url(override_url));
    match config.request_timeout_secs {
        Some(secs) => println!("timeout: {}s", secs),
        None => println!("timeout: none"),
    }
    println!("greeting: {}", config.greeting());
    Ok(())
}
