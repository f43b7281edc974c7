//! Seed command implementation.

use crate::backend::{build_embedder, open_store};
use crate::cli::SeedArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use minimem_domain::traits::Embedder;
use minimem_store::{seed_corpus, SeedFile};
use tracing::info;

/// Execute the seed command.
pub async fn execute_seed(args: SeedArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let seed = match &args.file {
        Some(path) => SeedFile::from_file(path)?,
        None => SeedFile::demo()?,
    };

    if args.reset {
        let path = config.database_path()?;
        if path.exists() {
            info!("Removing {}", path.display());
            std::fs::remove_file(&path)?;
        }
    }

    let embedder = build_embedder(config)?;
    let store = open_store(config, embedder.dimension())?;

    info!(
        "Seeding {} meeting(s) with {} decision(s)",
        seed.meetings.len(),
        seed.decision_count()
    );
    let stats = seed_corpus(&store, &embedder, &seed).await?;

    println!("{}", formatter.format_stats(&stats)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EmbeddingProviderKind, OutputFormat};
    use minimem_store::SqliteDecisionStore;

    fn hash_config(dir: &std::path::Path, dimension: usize) -> Config {
        let mut config = Config::default();
        config.database.path = Some(dir.join("minimem.db"));
        config.embedding.provider = EmbeddingProviderKind::Hash;
        config.embedding.dimension = Some(dimension);
        config
    }

    #[tokio::test]
    async fn test_seed_demo() {
        let dir = tempfile::tempdir().unwrap();
        let config = hash_config(dir.path(), 128);
        let formatter = Formatter::new(OutputFormat::Quiet, false);

        execute_seed(SeedArgs { file: None, reset: false }, &config, &formatter)
            .await
            .unwrap();

        let store = SqliteDecisionStore::open(dir.path().join("minimem.db"), 128).unwrap();
        assert_eq!(store.stats().unwrap().decisions, 12);
    }

    #[tokio::test]
    async fn test_seed_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let seed_path = dir.path().join("seed.toml");
        std::fs::write(
            &seed_path,
            r#"
            [[meetings]]
            title = "Budget Review"
            date = "2025-03-01"
            decisions = ["Freeze hiring until Q3"]
            "#,
        )
        .unwrap();

        let config = hash_config(dir.path(), 64);
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        execute_seed(
            SeedArgs {
                file: Some(seed_path),
                reset: false,
            },
            &config,
            &formatter,
        )
        .await
        .unwrap();

        let store = SqliteDecisionStore::open(dir.path().join("minimem.db"), 64).unwrap();
        let meetings = store.meetings().unwrap();
        assert_eq!(meetings.len(), 1);
        assert_eq!(meetings[0].decisions, vec!["Freeze hiring until Q3".to_string()]);
    }

    #[tokio::test]
    async fn test_reset_allows_dimension_change() {
        let dir = tempfile::tempdir().unwrap();
        let formatter = Formatter::new(OutputFormat::Quiet, false);

        execute_seed(SeedArgs { file: None, reset: false }, &hash_config(dir.path(), 64), &formatter)
            .await
            .unwrap();

        let wider = hash_config(dir.path(), 96);
        assert!(execute_seed(SeedArgs { file: None, reset: false }, &wider, &formatter)
            .await
            .is_err());

        execute_seed(SeedArgs { file: None, reset: true }, &wider, &formatter)
            .await
            .unwrap();
        let store = SqliteDecisionStore::open(dir.path().join("minimem.db"), 96).unwrap();
        assert_eq!(store.stats().unwrap().decisions, 12);
    }
}
