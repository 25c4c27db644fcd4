//! scanrename: rename scanned mastery checks by the student name, date and
//! module code recognised on the page.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use scanrename_core::RenameConfig;

mod commands;
mod progress;

use commands::{ConfigCommands, ExtractArgs, RunArgs, UndoArgs, WatchArgs};

/// Rename scanned mastery checks from their recognised text
#[derive(Parser, Debug)]
#[command(name = "scanrename")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (TOML); defaults apply when it does not exist
    #[arg(short, long, default_value = "scanrename.toml", global = true)]
    config: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress the progress bar and status lines
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rename every eligible scan in a folder
    Run(RunArgs),

    /// Print the fields found in a recognised-text file (or stdin)
    Extract(ExtractArgs),

    /// Rename existing scans, then keep renaming new ones as they arrive
    Watch(WatchArgs),

    /// Move renamed files back using the journal
    Undo(UndoArgs),

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match (cli.quiet, cli.verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Run(args) => commands::run(config, args, cli.quiet),
        Commands::Extract(args) => commands::extract(&config, args),
        Commands::Watch(args) => commands::watch(config, args, cli.quiet),
        Commands::Undo(args) => commands::undo(args),
        Commands::Config { action } => commands::config(&config, action, &cli.config),
    }
}

fn load_config(path: &Path) -> anyhow::Result<RenameConfig> {
    if path.exists() {
        Ok(RenameConfig::load(path)?)
    } else {
        info!("Config file not found at {}, using defaults", path.display());
        Ok(RenameConfig::default())
    }
}
