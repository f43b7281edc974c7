//! Decisions command implementation.

use crate::backend::open_store;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;

/// Execute the decisions command.
pub fn execute_decisions(config: &Config, formatter: &Formatter) -> Result<()> {
    let store = open_store(config, config.embedding.dimension())?;
    let meetings = store.meetings()?;
    println!("{}", formatter.format_meetings(&meetings)?);
    Ok(())
}
