//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use oh_core::config;
use oh_core::endpoint::Endpoint;

mod commands;

#[derive(Parser)]
#[command(name = "oh")]
#[command(version = "0.1")]
#[command(about = "Terminal client for the OH agent backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Conversation to open in chat mode
    #[arg(long, value_name = "ID", env = "OH_CONVERSATION_ID")]
    conversation: Option<String>,

    /// Backend base URL (overrides OH_BACKEND_BASE_URL and the config file)
    #[arg(long, value_name = "URL", global = true)]
    backend: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Stream a conversation's events as JSON lines
    Events {
        /// The conversation to follow
        #[arg(long, value_name = "ID")]
        conversation: String,

        /// Send a user message once the stream is open
        #[arg(long, value_name = "TEXT")]
        send: Option<String>,

        /// Print one readable line per event instead of raw JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Log in with GitHub through the backend
    Login {
        /// Authorization code or full redirect URL (skips the local callback)
        #[arg(long, value_name = "URL_OR_CODE")]
        code: Option<String>,
    },

    /// Log out (clear stored credentials)
    Logout,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let Cli {
        command,
        conversation,
        backend,
    } = cli;

    let config = config::Config::load().context("load config")?;
    let endpoint = resolve_endpoint(backend.as_deref(), &config)?;

    // default to chat mode
    let Some(command) = command else {
        return commands::chat::run(&config, endpoint, conversation.as_deref()).await;
    };

    match command {
        Commands::Events {
            conversation,
            send,
            pretty,
        } => {
            commands::events::run(commands::events::EventsOptions {
                config: &config,
                endpoint,
                conversation_id: &conversation,
                send: send.as_deref(),
                pretty,
            })
            .await
        }
        Commands::Login { code } => commands::auth::login(endpoint, code.as_deref()).await,
        Commands::Logout => commands::auth::logout(),
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },
    }
}

fn resolve_endpoint(flag: Option<&str>, config: &config::Config) -> Result<Endpoint> {
    let raw = match flag {
        Some(url) => url.to_string(),
        None => config.backend.effective_base_url(),
    };
    Endpoint::parse(&raw).with_context(|| format!("invalid backend URL '{raw}'"))
}
