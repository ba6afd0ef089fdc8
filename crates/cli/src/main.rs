//! CLI entrypoint and subcommand orchestration.

mod config;
mod store;
#[cfg(test)]
mod test_support;
mod tui;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use llm::{ChatClient, OpenAiChatClient};
use proto::{ChatEvent, ScreenError};

use crate::config::Config;
use crate::store::Credentials;

#[cfg(not(test))]
use llm::ChatRequest;
#[cfg(not(test))]
use tracing::{info, warn};
#[cfg(not(test))]
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Top-level command-line arguments for pocketgpt.
#[derive(Parser)]
#[command(name = "pocketgpt")]
#[command(about = "Terminal ChatGPT client", version)]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable debug logging to <data dir>/logs/debug.log
    #[arg(long, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// CLI subcommands available in the application.
#[derive(Subcommand)]
enum Commands {
    /// Start the full-screen chat (default when no subcommand is given)
    Tui,

    /// Store the API key and organization id
    Login {
        /// OpenAI API key
        #[arg(long)]
        api_key: String,

        /// OpenAI organization id
        #[arg(long)]
        org: String,
    },

    /// Remove the stored credentials
    Logout,

    /// Send one message and stream the reply to stdout
    Run {
        /// Message to send
        #[arg(short = 'e', long)]
        exec: String,

        /// Use the GPT-4 model instead of the default
        #[arg(long, default_value_t = false)]
        gpt4: bool,
    },
}

impl Commands {
    fn label(&self) -> &'static str {
        match self {
            Commands::Tui => "tui",
            Commands::Login { .. } => "login",
            Commands::Logout => "logout",
            Commands::Run { .. } => "run",
        }
    }
}

#[cfg(not(test))]
#[tokio::main]
/// Program entrypoint.
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Determine effective command (default to Tui if none given)
    let command = cli.command.unwrap_or(Commands::Tui);
    let is_tui = matches!(command, Commands::Tui);

    // Config is loaded before tracing so the log directory can follow `storage.dir`.
    let loaded = Config::load(cli.config.as_deref());
    let log_dir = loaded
        .as_ref()
        .map(Config::log_dir)
        .unwrap_or_else(|_| Config::default().log_dir());

    // Initialize tracing. Console output is suppressed in TUI mode to avoid corrupting the display.
    // When --debug is passed, write debug-level logs to <data dir>/logs/debug.YYYY-MM-DD.log.
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    // WorkerGuard must outlive main() so buffered file writes are flushed on exit.
    let _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>;

    let debug_writer = if cli.debug {
        std::fs::create_dir_all(&log_dir).ok();
        let appender = tracing_appender::rolling::daily(&log_dir, "debug.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        _file_guard = Some(guard);
        Some(writer)
    } else {
        _file_guard = None;
        None
    };

    match (is_tui, debug_writer) {
        (true, Some(writer)) => {
            let console = fmt::layer()
                .with_writer(std::io::sink)
                .with_target(false)
                .with_filter(console_filter);
            let file = fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false)
                .with_filter(EnvFilter::new("debug,hyper_util=info,rustls=info,reqwest=info"));
            tracing_subscriber::registry()
                .with(console)
                .with(file)
                .init();
        }
        (true, None) => {
            fmt()
                .with_env_filter(console_filter)
                .with_writer(std::io::sink)
                .with_target(false)
                .init();
        }
        (false, Some(writer)) => {
            let console = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(console_filter);
            let file = fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false)
                .with_filter(EnvFilter::new("debug,hyper_util=info,rustls=info,reqwest=info"));
            tracing_subscriber::registry()
                .with(console)
                .with(file)
                .init();
        }
        (false, None) => {
            fmt()
                .with_env_filter(console_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
    }

    // Emit session-start marker when --debug is active so each run is easily identifiable.
    if cli.debug {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            command = command.label(),
            log_level = %cli.log_level,
            "========== pocketgpt session start =========="
        );
    }

    let config = loaded.unwrap_or_else(|e| {
        warn!("Failed to load config ({e}), using defaults");
        Config::default()
    });

    match command {
        Commands::Tui => cmd_tui(config).await,
        Commands::Login { api_key, org } => cmd_login(&config, api_key, org),
        Commands::Logout => cmd_logout(&config),
        Commands::Run { exec, gpt4 } => cmd_run(config, exec, gpt4).await,
    }
}

/// Builds the streaming client for `creds`, honoring `api.base_url`.
fn build_client(config: &Config, creds: &Credentials) -> Arc<dyn ChatClient> {
    match &config.api.base_url {
        Some(base_url) => Arc::new(OpenAiChatClient::with_base_url(
            creds.api_key.as_str(),
            creds.organization_id.as_str(),
            base_url.as_str(),
        )),
        None => Arc::new(OpenAiChatClient::new(
            creds.api_key.as_str(),
            creds.organization_id.as_str(),
        )),
    }
}

#[cfg(not(test))]
/// Starts the full-screen chat.
async fn cmd_tui(config: Config) -> anyhow::Result<()> {
    let factory: tui::ClientFactory = {
        let config = config.clone();
        Box::new(move |creds: &Credentials| build_client(&config, creds))
    };
    let chat = tui::ChatScreen::new(
        factory,
        Box::new(config.open_preferences()),
        config.models.clone(),
        config.chat.include_history,
    );
    let app = tui::TuiApp::new(chat, Box::new(config.open_credentials()));
    tui::run_tui(app).await
}

#[cfg(not(test))]
/// Writes both credential values after trimming.
fn cmd_login(config: &Config, api_key: String, org: String) -> anyhow::Result<()> {
    let creds = Credentials {
        api_key: api_key.trim().to_string(),
        organization_id: org.trim().to_string(),
    };
    if creds.api_key.is_empty() || creds.organization_id.is_empty() {
        anyhow::bail!("Both --api-key and --org must be non-empty");
    }
    let mut store = config.open_credentials();
    creds.write(&mut store)?;
    println!("Credentials saved to {}", config.credentials_path().display());
    Ok(())
}

#[cfg(not(test))]
/// Removes stored credentials.
fn cmd_logout(config: &Config) -> anyhow::Result<()> {
    let mut store = store::FileStore::open(config.credentials_path())?;
    if Credentials::clear(&mut store)? {
        println!("Logged out. Credentials removed.");
    } else {
        println!("No stored credentials found.");
    }
    Ok(())
}

#[cfg(not(test))]
/// Streams one reply to stdout through the same client and listener as the chat screen.
async fn cmd_run(config: Config, exec: String, gpt4: bool) -> anyhow::Result<()> {
    use std::io::Write;

    check_exec(&exec)?;
    let store = config.open_credentials();
    let Some(creds) = Credentials::read(&store) else {
        anyhow::bail!("No credentials configured. Run `pocketgpt login --api-key <KEY> --org <ORG>`.");
    };
    let client = build_client(&config, &creds);
    let mut rx = client.events().add_listener();

    let model = config.models.resolve(if gpt4 { "4" } else { "3.5" });
    let handle = client.stream(ChatRequest::single(exec, model))?;

    let mut stdout = std::io::stdout();
    let mut outcome = Ok(());
    while let Some(event) = rx.recv().await {
        if event.stream_id() != handle.id() {
            continue;
        }
        match render_run_event(&event) {
            RunStep::Print(text) => {
                write!(stdout, "{text}")?;
                stdout.flush()?;
            }
            RunStep::Finish => break,
            RunStep::Fail(error) => {
                outcome = Err(anyhow::anyhow!(error));
                break;
            }
        }
    }
    writeln!(stdout)?;
    client.events().remove_listener();
    outcome
}

/// Rejects a whitespace-only `--exec`, the same way the chat screen does.
fn check_exec(exec: &str) -> Result<(), ScreenError> {
    if exec.trim().is_empty() {
        return Err(ScreenError::EmptyInput);
    }
    Ok(())
}

/// What `run` does with one event.
#[derive(Debug, PartialEq, Eq)]
enum RunStep {
    Print(String),
    Finish,
    Fail(String),
}

fn render_run_event(event: &ChatEvent) -> RunStep {
    match event {
        ChatEvent::Chunk { payload, .. } => {
            RunStep::Print(payload.first_delta().unwrap_or_default().to_string())
        }
        ChatEvent::Done { .. } => RunStep::Finish,
        ChatEvent::Failed { error, .. } => RunStep::Fail(error.clone()),
    }
}
