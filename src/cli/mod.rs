use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod ask;
pub mod chat;
pub mod host;
pub mod load;

use crate::core::AppConfig;

#[derive(Subcommand)]
enum Command {
    /// Start an interactive chat session
    Chat {},
    /// Ask a single question, optionally attaching files
    Ask {
        prompt: String,

        /// File to attach as context (repeatable)
        #[arg(long = "file")]
        files: Vec<PathBuf>,
    },
    /// Upload the workspace's source files into a codebase
    Load { codebase_name: String },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Base URL of the inference service
    #[arg(long, global = true)]
    api_base_url: Option<String>,

    /// Workspace root, defaults to the current directory
    #[arg(long, global = true)]
    workspace: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();

    // Logs go to stderr so they don't mix with the chat output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = AppConfig::default();
    if let Some(url) = args.api_base_url {
        config.api_base_url = url;
    }

    let workspace_root = match args.workspace {
        Some(path) => path,
        None => std::env::current_dir()?,
    };
    let workspace_root = workspace_root
        .canonicalize()
        .with_context(|| format!("Workspace {} not found", workspace_root.display()))?;

    // Handle each sub command
    match args.command {
        Some(Command::Chat {}) => {
            chat::run(&config, workspace_root).await?;
        }
        Some(Command::Ask { prompt, files }) => {
            ask::run(&config, workspace_root, &prompt, files).await?;
        }
        Some(Command::Load { codebase_name }) => {
            load::run(&config, workspace_root, &codebase_name).await?;
        }
        None => {}
    }

    Ok(())
}
