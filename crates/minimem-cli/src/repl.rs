//! Interactive REPL (Read-Eval-Print Loop) mode.
//!
//! Every line typed is a conversation turn. After each turn the whole
//! conversation so far is checked and the verdict printed.

use crate::backend::{build_judge, Judge};
use crate::commands::check::parse_turn;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use minimem_domain::ConversationTurn;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;

/// Run the interactive REPL.
pub async fn run_repl(config: &Config, formatter: &Formatter) -> Result<()> {
    let judge = build_judge(config)?;

    println!(
        "{}",
        formatter.info("MiniMem REPL - Type a message to check it, '/help' for commands")
    );
    println!();

    let editor_config = rustyline::Config::builder()
        .max_history_size(config.settings.history_size)
        .map_err(editor_error)?
        .build();
    let mut editor = DefaultEditor::with_config(editor_config).map_err(editor_error)?;

    // Load history
    let history_path = get_history_path()?;
    let _ = editor.load_history(&history_path);

    let mut history: Vec<ConversationTurn> = Vec::new();

    loop {
        let prompt = format!("minimem [{}]> ", history.len());

        match editor.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();

                if line.is_empty() {
                    continue;
                }

                editor.add_history_entry(line).ok();

                match parse_repl_line(line) {
                    ReplCommand::Exit => {
                        println!("{}", formatter.info("Goodbye!"));
                        break;
                    }
                    ReplCommand::Help => print_help(formatter),
                    ReplCommand::Reset => {
                        history.clear();
                        println!("{}", formatter.info("Conversation cleared"));
                    }
                    ReplCommand::History => print_history(&history, formatter),
                    ReplCommand::Turn(turn) => {
                        history.push(turn);
                        if let Err(e) = check(&judge, &history, formatter).await {
                            eprintln!("{}", formatter.error(&e.to_string()));
                        }
                    }
                    ReplCommand::Unknown(command) => {
                        eprintln!(
                            "{}",
                            formatter.error(&format!(
                                "Unknown command: {}. Type '/help' for available commands.",
                                command
                            ))
                        );
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", formatter.info("Use '/exit' to quit"));
            }
            Err(ReadlineError::Eof) => {
                break;
            }
            Err(err) => {
                eprintln!("{}", formatter.error(&format!("Error: {}", err)));
                break;
            }
        }
    }

    // Save history
    editor.save_history(&history_path).ok();

    Ok(())
}

async fn check(judge: &Judge, history: &[ConversationTurn], formatter: &Formatter) -> Result<()> {
    let verdict = judge.check_alignment(history).await?;
    println!("{}", formatter.format_verdict(&verdict)?);
    Ok(())
}

/// REPL input type.
#[derive(Debug, PartialEq)]
enum ReplCommand {
    Exit,
    Help,
    Reset,
    History,
    Turn(ConversationTurn),
    Unknown(String),
}

/// Parse a REPL line: slash commands, bare `exit`/`quit`, or a turn.
fn parse_repl_line(line: &str) -> ReplCommand {
    if matches!(line, "exit" | "quit") {
        return ReplCommand::Exit;
    }

    match line.strip_prefix('/') {
        Some(command) => match command.trim() {
            "exit" | "quit" | "q" => ReplCommand::Exit,
            "help" | "?" => ReplCommand::Help,
            "reset" | "clear" => ReplCommand::Reset,
            "history" => ReplCommand::History,
            other => ReplCommand::Unknown(other.to_string()),
        },
        None => ReplCommand::Turn(parse_turn(line)),
    }
}

fn print_history(history: &[ConversationTurn], formatter: &Formatter) {
    if history.is_empty() {
        println!("{}", formatter.info("No turns yet"));
        return;
    }
    for turn in history {
        println!("  {}", turn.render());
    }
}

/// Print help message.
fn print_help(formatter: &Formatter) {
    println!("{}", formatter.info("Type a message to add it as a turn and check the conversation."));
    println!();
    println!("Turns:");
    println!("  <text>                  A user turn");
    println!("  teammate: <text>        A teammate turn");
    println!("  system: <text>          A system turn");
    println!();
    println!("Commands:");
    println!("  /history                Show the conversation so far");
    println!("  /reset                  Start a new conversation");
    println!("  /help                   Show this help");
    println!("  /exit                   Exit the REPL");
    println!();
}

/// Get the REPL history file path.
fn get_history_path() -> Result<PathBuf> {
    let dir = Config::home_dir()?;
    std::fs::create_dir_all(&dir)?;
    Ok(dir.join("history.txt"))
}

fn editor_error(e: ReadlineError) -> CliError {
    CliError::Io(std::io::Error::other(format!(
        "Failed to initialize editor: {}",
        e
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_forms() {
        assert_eq!(parse_repl_line("exit"), ReplCommand::Exit);
        assert_eq!(parse_repl_line("quit"), ReplCommand::Exit);
        assert_eq!(parse_repl_line("/q"), ReplCommand::Exit);
    }

    #[test]
    fn test_slash_commands() {
        assert_eq!(parse_repl_line("/help"), ReplCommand::Help);
        assert_eq!(parse_repl_line("/?"), ReplCommand::Help);
        assert_eq!(parse_repl_line("/clear"), ReplCommand::Reset);
        assert_eq!(parse_repl_line("/history"), ReplCommand::History);
        assert_eq!(
            parse_repl_line("/frobnicate"),
            ReplCommand::Unknown("frobnicate".to_string())
        );
    }

    #[test]
    fn test_turns() {
        assert_eq!(
            parse_repl_line("let's relaunch the mobile app"),
            ReplCommand::Turn(ConversationTurn::user("let's relaunch the mobile app"))
        );
        assert_eq!(
            parse_repl_line("teammate: the app is on hold"),
            ReplCommand::Turn(ConversationTurn::teammate("the app is on hold"))
        );
        // Only exact words exit; a sentence starting with one is a turn
        assert_eq!(
            parse_repl_line("exit strategy for the pilot?"),
            ReplCommand::Turn(ConversationTurn::user("exit strategy for the pilot?"))
        );
    }
}
