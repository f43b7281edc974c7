//! CLI command definitions and argument parsing.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// MiniMem - check conversations against past meeting decisions.
#[derive(Debug, Parser)]
#[command(name = "minimem")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "MINIMEM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (one word per result)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write a default config file and create the decision store
    Init(InitArgs),

    /// Load meetings and decisions into the store
    Seed(SeedArgs),

    /// Check a conversation against stored decisions
    Check(CheckArgs),

    /// List stored meetings and their decisions
    Decisions,

    /// Verify the store is reachable and report its size
    Health,

    /// Enter interactive REPL mode
    Repl,
}

/// Arguments for the init command.
#[derive(Debug, Parser)]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the seed command.
#[derive(Debug, Parser)]
pub struct SeedArgs {
    /// TOML seed file; the bundled demo meetings when omitted
    #[arg(short = 'i', long)]
    pub file: Option<PathBuf>,

    /// Delete the database file first (needed after changing embedding dimension)
    #[arg(long)]
    pub reset: bool,
}

/// Arguments for the check command.
#[derive(Debug, Parser)]
pub struct CheckArgs {
    /// Conversation turns, oldest first ("teammate: ..." or plain text for the user)
    #[arg(short, long = "turn")]
    pub turns: Vec<String>,

    /// JSON file containing an array of `{"speaker", "text"}` turns
    #[arg(short = 'i', long, conflicts_with = "stdin")]
    pub file: Option<PathBuf>,

    /// JSON array of turns from stdin
    #[arg(long)]
    pub stdin: bool,

    /// Overall deadline for the check in seconds
    #[arg(long)]
    pub deadline: Option<u64>,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}
