//! etl: load Sparkify song and log data into the warehouse.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

mod commands;

/// Environment variable holding the log filter (e.g. `debug`, `warehouse=debug`).
const LOG_ENV_VAR: &str = "SPARKIFY_LOG";

#[derive(Parser)]
#[command(name = "etl")]
#[command(about = "Load Sparkify song metadata and listening logs into DuckDB")]
#[command(version)]
struct Cli {
    /// Config file (default: $SPARKIFY_CONFIG, ./sparkify.toml, then the platform config dir)
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the star schema tables
    Init {
        /// Drop existing tables first (deletes all loaded data)
        #[arg(long)]
        reset: bool,

        /// Write the effective configuration to PATH (must not exist)
        #[arg(long, value_name = "PATH")]
        save_config: Option<PathBuf>,
    },

    /// Load song files, then log files (the default)
    Load {
        /// Only load song metadata
        #[arg(long, conflicts_with = "logs_only")]
        songs_only: bool,

        /// Only load activity logs
        #[arg(long)]
        logs_only: bool,

        /// Create the tables first if the database does not exist
        #[arg(long)]
        init: bool,
    },

    /// Show row counts per table
    Counts,
}

fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var(LOG_ENV_VAR)
        .from_env_lossy();

    // Ignore a second init (e.g. from tests); the first subscriber stays
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let config = cli.config.as_deref();
    let result = match cli.command.unwrap_or(Commands::Load {
        songs_only: false,
        logs_only: false,
        init: false,
    }) {
        Commands::Init { reset, save_config } => commands::init(config, reset, save_config.as_deref()),
        Commands::Load { songs_only, logs_only, init } => {
            let selection = warehouse::Selection {
                songs: !logs_only,
                logs: !songs_only,
            };
            commands::load(config, selection, init)
        }
        Commands::Counts => commands::counts(config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
