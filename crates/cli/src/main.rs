//! autocommit CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;
mod locks;
mod system_config;
mod util;

/// autocommit - commit and push a git working tree whenever it settles
#[derive(Parser)]
#[command(name = "autocommit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch a repository in the foreground
    Watch {
        /// Repository path (default: current directory)
        path: Option<PathBuf>,

        /// Quiet period in milliseconds before committing
        #[arg(long)]
        debounce_ms: Option<u64>,

        /// Commit without pushing
        #[arg(long)]
        no_push: bool,

        /// Write logs to a daily rolling file in this directory
        #[arg(long)]
        log_dir: Option<PathBuf>,
    },
    /// Start watching in the background
    Start {
        /// Repository path (default: current directory)
        path: Option<PathBuf>,

        /// Run in foreground (for debugging)
        #[arg(long)]
        foreground: bool,
    },
    /// Stop the background watcher
    Stop {
        /// Repository path (default: current directory)
        path: Option<PathBuf>,
    },
    /// Show watcher state and pending changes
    Status {
        /// Repository path (default: current directory)
        path: Option<PathBuf>,
    },
    /// Commit (and push) pending changes now
    Commit {
        /// Repository path (default: current directory)
        path: Option<PathBuf>,

        /// Commit without pushing
        #[arg(long)]
        no_push: bool,
    },
    /// View and edit configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// List all configuration values
    List,
    /// Print a single value
    Get {
        /// Dotted key, e.g. watch.debounce_ms
        key: String,
    },
    /// Set a value
    Set {
        /// Dotted key, e.g. git.push
        key: String,
        value: String,
    },
    /// Show the config file location
    Path {
        /// Create the file with defaults if missing
        #[arg(long)]
        create: bool,
    },
    /// Print an example configuration
    Example,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Long-running commands log at info, one-shot commands stay quiet
    let (log_dir, level) = match &cli.command {
        Commands::Watch { log_dir, .. } => (log_dir.as_deref(), "info"),
        Commands::Start { foreground: true, .. } => (None, "info"),
        _ => (None, "warn"),
    };
    let _log_guard = util::init_logging(log_dir, level)?;

    match cli.command {
        Commands::Watch { path, debounce_ms, no_push, .. } => {
            cmd::watch::run(path.as_deref(), debounce_ms, no_push).await
        }
        Commands::Start { path, foreground } => cmd::start::run(path.as_deref(), foreground).await,
        Commands::Stop { path } => cmd::stop::run(path.as_deref()).await,
        Commands::Status { path } => cmd::status::run(path.as_deref()).await,
        Commands::Commit { path, no_push } => cmd::commit::run(path.as_deref(), no_push).await,
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::List => cmd::config::run_list().await,
            ConfigCommands::Get { key } => cmd::config::run_get(&key).await,
            ConfigCommands::Set { key, value } => cmd::config::run_set(&key, &value).await,
            ConfigCommands::Path { create } => cmd::config::run_path(create).await,
            ConfigCommands::Example => cmd::config::run_example().await,
        },
    }
}
