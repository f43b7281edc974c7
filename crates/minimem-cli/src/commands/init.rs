//! Init command implementation.

use crate::backend::open_store;
use crate::cli::InitArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use std::path::Path;

/// Execute the init command.
///
/// Writes the configuration file unless one exists (or `--force`), then
/// creates an empty decision store sized for the configured embedder.
pub fn execute_init(
    args: InitArgs,
    config: &Config,
    config_path: Option<&Path>,
    formatter: &Formatter,
) -> Result<()> {
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => Config::path()?,
    };

    if path.exists() && !args.force {
        println!(
            "{}",
            formatter.info(&format!("Keeping existing config at {}", path.display()))
        );
    } else {
        config.save(Some(path.as_path()))?;
        println!(
            "{}",
            formatter.success(&format!("Wrote config to {}", path.display()))
        );
    }

    let store = open_store(config, config.embedding.dimension())?;
    let stats = store.stats()?;
    println!(
        "{}",
        formatter.success(&format!(
            "Decision store ready at {} ({} decision(s))",
            config.database_path()?.display(),
            stats.decisions
        ))
    );

    Ok(())
}
