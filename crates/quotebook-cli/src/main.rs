//! Quotebook CLI
//!
//! Command-line and terminal interface for a remote quote catalog.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use quotebook_core::{Config, HttpQuoteRepository, QuoteId, SyncController};

mod commands;
mod output;
mod prompt;
mod tui;

use output::{Output, OutputFormat};

/// Set to a level (e.g. `debug`) to enable logging
const LOG_ENV: &str = "QUOTEBOOK_LOG";

#[derive(Parser)]
#[command(name = "quotebook")]
#[command(about = "Quotebook - browse, search and collect quotes")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the TUI interface
    Tui,
    /// List all quotes
    #[command(alias = "ls")]
    List,
    /// Show a random quote
    Random,
    /// Search quotes by text or author
    Search {
        /// Search term
        term: String,
    },
    /// Add a new quote
    #[command(alias = "create")]
    Add {
        /// The quote
        #[arg(short, long)]
        text: String,
        /// Who said it
        #[arg(short, long)]
        author: String,
    },
    /// Edit a quote
    Edit {
        /// Quote ID
        id: QuoteId,
        /// New text
        #[arg(short, long)]
        text: Option<String>,
        /// New author
        #[arg(short, long)]
        author: Option<String>,
    },
    /// Delete a quote
    #[command(alias = "rm")]
    Delete {
        /// Quote ID
        id: QuoteId,
        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Get a quote suggestion from the external source
    External {
        /// Look up a quote by this author
        #[arg(short, long, conflicts_with = "text")]
        author: Option<String>,
        /// Look up a quote containing this text
        #[arg(short, long)]
        text: Option<String>,
        /// Add the suggestion to the catalog
        #[arg(long)]
        adopt: bool,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (api_url, request_timeout_secs, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands work without a reachable service
    if let Some(Commands::Config { command }) = &cli.command {
        return handle_config_command(command.clone(), config_path, &output);
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    // Handle TUI (default when no command given)
    let Some(command) = cli.command else {
        return tui::run(config).await;
    };
    if matches!(command, Commands::Tui) {
        return tui::run(config).await;
    }

    init_cli_logging();

    let repo = HttpQuoteRepository::from_config(&config)
        .context("Failed to set up the quote service client")?;
    let controller = SyncController::new(repo);

    match command {
        Commands::Tui | Commands::Config { .. } => unreachable!(), // Handled above
        Commands::List => commands::quote::list(&controller, &output).await,
        Commands::Random => commands::quote::random(&controller, &output).await,
        Commands::Search { term } => commands::quote::search(&controller, term, &output).await,
        Commands::Add { text, author } => {
            commands::quote::add(&controller, text, author, &output).await
        }
        Commands::Edit { id, text, author } => {
            commands::quote::edit(&controller, id, text, author, &output).await
        }
        Commands::Delete { id, yes } => {
            commands::quote::delete(&controller, id, yes, &output).await
        }
        Commands::External {
            author,
            text,
            adopt,
        } => {
            let query = commands::external::query_from_flags(author, text);
            commands::external::fetch(&controller, query, adopt, &output).await
        }
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Log to stderr, only if QUOTEBOOK_LOG is set
fn init_cli_logging() {
    let Ok(log_level) = std::env::var(LOG_ENV) else {
        return;
    };

    let env_filter = EnvFilter::new(format!(
        "quotebook_core={},quotebook={}",
        log_level, log_level
    ));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
