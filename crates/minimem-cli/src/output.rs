//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use minimem_domain::{AlignmentVerdict, Severity};
use minimem_store::{CorpusStats, MeetingSummary};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format an alignment verdict.
    pub fn format_verdict(&self, verdict: &AlignmentVerdict) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(verdict)?),
            OutputFormat::Table => Ok(self.format_verdict_table(verdict)),
            OutputFormat::Quiet => Ok(if verdict.aligned() {
                "aligned".to_string()
            } else {
                "misaligned".to_string()
            }),
        }
    }

    fn format_verdict_table(&self, verdict: &AlignmentVerdict) -> String {
        let details = match verdict.details() {
            Some(details) => details,
            None => {
                return self.success(&format!(
                    "Aligned (similarity {:.2})",
                    verdict.similarity()
                ))
            }
        };

        let date = verdict
            .meeting_date()
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        let similarity = format!("{:.2}", verdict.similarity());

        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        builder.push_record(["Issue", details.issue.as_str()]);
        builder.push_record(["Decision", details.relevant_decision.as_str()]);
        builder.push_record(["Meeting", details.meeting_title.as_str()]);
        builder.push_record(["Date", date.as_str()]);
        builder.push_record(["Severity", details.severity.as_str()]);
        builder.push_record(["Similarity", similarity.as_str()]);

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        let headline = format!("Misaligned ({} severity)", details.severity);
        let headline = match details.severity {
            Severity::High => self.error(&headline),
            Severity::Medium | Severity::Low => self.warning(&headline),
        };

        format!("{}\n{}", headline, table)
    }

    /// Format the stored meetings.
    pub fn format_meetings(&self, meetings: &[MeetingSummary]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let json: Vec<serde_json::Value> = meetings
                    .iter()
                    .map(|m| {
                        serde_json::json!({
                            "id": m.id,
                            "title": m.title,
                            "date": m.date.to_string(),
                            "decisions": m.decisions,
                            "participants": m.participants.iter().map(|p| {
                                serde_json::json!({ "name": p.name, "role": p.role })
                            }).collect::<Vec<_>>(),
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Table => Ok(self.format_meetings_table(meetings)),
            OutputFormat::Quiet => Ok(meetings
                .iter()
                .flat_map(|m| m.decisions.iter().cloned())
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    fn format_meetings_table(&self, meetings: &[MeetingSummary]) -> String {
        if meetings.is_empty() {
            return self.colorize("No meetings stored. Run `minimem seed` first.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["Date", "Meeting", "Decision"]);

        for meeting in meetings {
            let date = meeting.date.to_string();
            for (i, decision) in meeting.decisions.iter().enumerate() {
                // Date and title only on the first row of each meeting
                if i == 0 {
                    builder.push_record([date.as_str(), meeting.title.as_str(), decision.as_str()]);
                } else {
                    builder.push_record(["", "", decision.as_str()]);
                }
            }
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    /// Format corpus counts.
    pub fn format_stats(&self, stats: &CorpusStats) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "meetings": stats.meetings,
                "decisions": stats.decisions,
                "participants": stats.participants,
            }))?),
            OutputFormat::Table => Ok(self.info(&format!(
                "{} meeting(s), {} decision(s), {} participant(s)",
                stats.meetings, stats.decisions, stats.participants
            ))),
            OutputFormat::Quiet => Ok(stats.decisions.to_string()),
        }
    }

    /// Format the health report.
    pub fn format_health(&self, database: &str, model: &str, stats: &CorpusStats) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "status": "ok",
                "database": database,
                "model": model,
                "meetings": stats.meetings,
                "decisions": stats.decisions,
            }))?),
            OutputFormat::Table => {
                let mut lines = vec![self.success(&format!("Store reachable at {}", database))];
                lines.push(self.info(&format!("Judgment model: {}", model)));
                if stats.decisions == 0 {
                    lines.push(self.warning("No decisions stored; every check will pass"));
                } else {
                    lines.push(self.info(&format!(
                        "{} decision(s) across {} meeting(s)",
                        stats.decisions, stats.meetings
                    )));
                }
                Ok(lines.join("\n"))
            }
            OutputFormat::Quiet => Ok("ok".to_string()),
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}
