//! Check command implementation.

use crate::backend::build_judge;
use crate::cli::CheckArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use minimem_domain::{ConversationTurn, Speaker};
use std::fs;
use std::io::{self, Read};
use std::time::Duration;

/// Execute the check command.
///
/// Returns whether the conversation is aligned, so the caller can pick an
/// exit status.
pub async fn execute_check(args: CheckArgs, config: &Config, formatter: &Formatter) -> Result<bool> {
    let history = read_history(&args)?;
    if history.is_empty() {
        return Err(CliError::InvalidInput(
            "Provide turns with --turn, --file or --stdin".to_string(),
        ));
    }
    if history.iter().all(ConversationTurn::is_blank) {
        return Err(CliError::InvalidInput("Every turn is blank".to_string()));
    }

    let judge = build_judge(config)?;
    let verdict = match args.deadline {
        Some(secs) => {
            judge
                .check_alignment_within(&history, Duration::from_secs(secs))
                .await?
        }
        None => judge.check_alignment(&history).await?,
    };

    println!("{}", formatter.format_verdict(&verdict)?);
    Ok(verdict.aligned())
}

fn read_history(args: &CheckArgs) -> Result<Vec<ConversationTurn>> {
    let json_data = if args.stdin {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Some(buffer)
    } else if let Some(path) = &args.file {
        Some(fs::read_to_string(path)?)
    } else {
        None
    };

    let mut history: Vec<ConversationTurn> = match json_data {
        Some(data) => serde_json::from_str(&data)?,
        None => Vec::new(),
    };
    history.extend(args.turns.iter().map(|line| parse_turn(line)));
    Ok(history)
}

/// Parse `"speaker: text"`; lines without a known speaker prefix are user turns.
pub fn parse_turn(line: &str) -> ConversationTurn {
    if let Some((prefix, text)) = line.split_once(':') {
        if let Ok(speaker) = prefix.parse::<Speaker>() {
            return ConversationTurn::new(speaker, text.trim());
        }
    }
    ConversationTurn::user(line.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CompletionProviderKind, EmbeddingProviderKind, OutputFormat};

    fn args(turns: &[&str]) -> CheckArgs {
        CheckArgs {
            turns: turns.iter().map(|t| t.to_string()).collect(),
            file: None,
            stdin: false,
            deadline: None,
        }
    }

    #[test]
    fn test_parse_turn() {
        assert_eq!(
            parse_turn("teammate: the redesign is paused"),
            ConversationTurn::teammate("the redesign is paused")
        );
        assert_eq!(parse_turn("AI: sure"), ConversationTurn::teammate("sure"));
        assert_eq!(parse_turn("System:  reset"), ConversationTurn::system("reset"));
        assert_eq!(
            parse_turn("note: ship it Friday"),
            ConversationTurn::user("note: ship it Friday")
        );
        assert_eq!(parse_turn("  plain text "), ConversationTurn::user("plain text"));
    }

    #[test]
    fn test_history_from_file_then_turns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("turns.json");
        fs::write(
            &path,
            r#"[{"speaker": "user", "text": "hi"}, {"sender": "assistant", "content": "hello"}]"#,
        )
        .unwrap();

        let mut check = args(&["restart the mobile app"]);
        check.file = Some(path);

        let history = read_history(&check).unwrap();
        assert_eq!(
            history,
            vec![
                ConversationTurn::user("hi"),
                ConversationTurn::teammate("hello"),
                ConversationTurn::user("restart the mobile app"),
            ]
        );
    }

    #[test]
    fn test_bad_json_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("turns.json");
        fs::write(&path, r#"{"speaker": "user"}"#).unwrap();

        let mut check = args(&[]);
        check.file = Some(path);
        assert!(matches!(read_history(&check), Err(CliError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_check_requires_turns() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let result = execute_check(args(&[]), &Config::default(), &formatter).await;
        assert!(matches!(result, Err(CliError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_check_rejects_only_blank_turns() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let result = execute_check(args(&["", "user:   "]), &Config::default(), &formatter).await;
        assert!(matches!(result, Err(CliError::InvalidInput(msg)) if msg.contains("blank")));
    }

    #[tokio::test]
    async fn test_offline_check_is_aligned() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.database.path = Some(dir.path().join("minimem.db"));
        config.embedding.provider = EmbeddingProviderKind::Hash;
        config.completion.provider = CompletionProviderKind::Mock;

        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let mut check = args(&["what's for lunch?"]);
        check.deadline = Some(5);

        assert!(execute_check(check, &config, &formatter).await.unwrap());
    }
}
