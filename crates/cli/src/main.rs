//! Loadstone CLI: the main entry point.
//!
//! Commands:
//! - `fetch`     Load a resource through the cache and worker pools
//! - `inspect`   Parse a catalog, tool group or tool and print it as JSON
//! - `cache`     List or clear the persistent cache
//! - `config`    Show the effective configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "loadstone",
    about = "Loadstone: cache-first resource loading",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a resource (cache first, then the configured locations)
    Fetch {
        /// Absolute URI, or a path relative to the configured search roots
        uri: String,

        /// Write the bytes here instead of printing a summary
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse typed content and print it as JSON
    Inspect {
        uri: String,

        /// Override the MIME type used to pick a parser
        #[arg(short, long)]
        mime: Option<String>,
    },

    /// Manage the persistent asset cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// List cached URIs
    List,
    /// Remove every cached asset
    Clear,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    match cli.command {
        Commands::Fetch { uri, output } => commands::fetch::run(&uri, output).await?,
        Commands::Inspect { uri, mime } => commands::inspect::run(&uri, mime).await?,
        Commands::Cache { action } => match action {
            CacheAction::List => commands::cache::list().await?,
            CacheAction::Clear => commands::cache::clear().await?,
        },
        Commands::Config { action } => match action.unwrap_or(ConfigAction::Show) {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
        },
    }

    Ok(())
}
