//! Voyager CLI
//!
//! Main entry point for the voyager travel-advisory tool. Provides
//! commands for indexing the travel corpus and asking multilingual
//! questions answered from it.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, IndexCommand, StatsCommand};
use std::path::PathBuf;
use voyager_core::{config::AppConfig, logging, AppResult};

/// Voyager - multilingual travel questions answered from your corpus
#[derive(Parser, Debug)]
#[command(name = "voyager")]
#[command(about = "Multilingual travel questions answered from your corpus", long_about = None)]
#[command(version)]
struct Cli {
    /// Root data directory (corpus, index, config file)
    #[arg(short, long, global = true, env = "VOYAGER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "VOYAGER_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Generation provider (gemini, mock)
    #[arg(short, long, global = true, env = "VOYAGER_PROVIDER")]
    provider: Option<String>,

    /// Generation model identifier
    #[arg(short, long, global = true, env = "VOYAGER_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build or rebuild the vector index from the corpus
    Index(IndexCommand),

    /// Ask a travel question (French, English, Arabic, Tunisian dialect)
    Ask(AskCommand),

    /// Show index statistics
    Stats(StatsCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from environment
    let config = AppConfig::load()?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.data_dir,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Voyager CLI starting");
    tracing::debug!("Data directory: {:?}", config.data_dir);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    let command_name = match &cli.command {
        Commands::Index(_) => "index",
        Commands::Ask(_) => "ask",
        Commands::Stats(_) => "stats",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Index(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
