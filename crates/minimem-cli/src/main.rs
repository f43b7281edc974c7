//! MiniMem CLI - check conversations against past meeting decisions.

use anyhow::Context;
use clap::Parser;
use minimem_cli::commands;
use minimem_cli::repl;
use minimem_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

/// Exit status when a check finds a contradiction
const EXIT_MISALIGNED: i32 = 2;

#[tokio::main]
async fn main() {
    match run().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(EXIT_MISALIGNED),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run() -> anyhow::Result<bool> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize tracing (log to stderr so stdout stays machine-readable)
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    let config_path = cli.config.as_deref();
    let config = Config::load(config_path).context("Failed to load configuration")?;

    // Determine output format
    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        None | Some(Command::Repl) => {
            repl::run_repl(&config, &formatter).await?;
        }
        Some(Command::Init(args)) => {
            commands::execute_init(args, &config, config_path, &formatter)?;
        }
        Some(Command::Seed(args)) => {
            commands::execute_seed(args, &config, &formatter)
                .await
                .context("Seeding failed")?;
        }
        Some(Command::Check(args)) => {
            return Ok(commands::execute_check(args, &config, &formatter).await?);
        }
        Some(Command::Decisions) => {
            commands::execute_decisions(&config, &formatter)?;
        }
        Some(Command::Health) => {
            commands::execute_health(&config, &formatter)?;
        }
    }

    Ok(true)
}
