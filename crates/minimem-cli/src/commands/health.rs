//! Health command implementation.

use crate::backend::{build_completion, open_store};
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use minimem_domain::traits::CompletionModel;
use tracing::debug;

/// Execute the health command.
///
/// Opens the store, pings it and reports counts. The completion provider is
/// constructed (so a missing API key shows up here) but not called.
pub fn execute_health(config: &Config, formatter: &Formatter) -> Result<()> {
    let store = open_store(config, config.embedding.dimension())?;
    store.ping()?;
    let stats = store.stats()?;
    debug!("Store answered: {:?}", stats);

    let llm = build_completion(config)?;
    let database = config.database_path()?;

    println!(
        "{}",
        formatter.format_health(&database.display().to_string(), llm.model_name(), &stats)?
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CompletionProviderKind, EmbeddingProviderKind, OutputFormat};
    use crate::error::CliError;

    fn offline_config(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.database.path = Some(dir.join("minimem.db"));
        config.embedding.provider = EmbeddingProviderKind::Hash;
        config.completion.provider = CompletionProviderKind::Mock;
        config
    }

    #[test]
    fn test_health_on_fresh_store() {
        let dir = tempfile::tempdir().unwrap();
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        execute_health(&offline_config(dir.path()), &formatter).unwrap();
    }

    #[test]
    fn test_health_reports_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = offline_config(dir.path());
        config.completion.provider = CompletionProviderKind::OpenAi;
        config.api_key_env = "MINIMEM_HEALTH_KEY_NOT_SET".to_string();

        let formatter = Formatter::new(OutputFormat::Quiet, false);
        assert!(matches!(
            execute_health(&config, &formatter),
            Err(CliError::Provider(_))
        ));
    }
}
