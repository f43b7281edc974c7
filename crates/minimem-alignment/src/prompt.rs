//! Adjudication prompt construction

use minimem_domain::RetrievalHit;

/// Builds the prompt asking the LLM whether a conversation contradicts
/// recorded decisions
pub struct PromptBuilder<'a> {
    conversation: &'a str,
    decisions: &'a [RetrievalHit],
}

impl<'a> PromptBuilder<'a> {
    /// Create a builder from the rendered window and the retrieved decisions
    pub fn new(conversation: &'a str, decisions: &'a [RetrievalHit]) -> Self {
        Self {
            conversation,
            decisions,
        }
    }

    /// Build the complete adjudication prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(ROLE_INSTRUCTIONS);
        prompt.push_str("\n\n");

        prompt.push_str("## Recent Conversation\n");
        prompt.push_str(self.conversation);
        prompt.push_str("\n\n");

        prompt.push_str("## Recorded Company Decisions\n");
        for hit in self.decisions {
            prompt.push_str(&format!(
                "- \"{}\" (from \"{}\", {})\n",
                hit.decision.text(),
                hit.decision.meeting_title(),
                hit.decision.meeting_date().format("%Y-%m-%d")
            ));
        }
        prompt.push('\n');

        prompt.push_str(JUDGMENT_RULES);
        prompt.push_str("\n\n");
        prompt.push_str(OUTPUT_FORMAT);

        prompt
    }
}

const ROLE_INSTRUCTIONS: &str = r#"You are an organizational alignment checker for a startup.

Your job: determine whether the recent conversation CONTRADICTS any of the company's recorded decisions."#;

const JUDGMENT_RULES: &str = r#"## Instructions
- Only flag a contradiction if the conversation is actively suggesting work or direction that goes against a decision.
- Do NOT flag if the conversation is simply mentioning or acknowledging a past decision.
- Do NOT flag neutral or unrelated conversation."#;

const OUTPUT_FORMAT: &str = r#"Respond ONLY with valid JSON (no markdown, no explanation) in this exact shape:
{
  "aligned": true,
  "issue": null,
  "relevant_decision": null,
  "meeting_title": null,
  "severity": null
}

or if misaligned:
{
  "aligned": false,
  "issue": "One sentence describing the contradiction",
  "relevant_decision": "The exact decision text that is being contradicted",
  "meeting_title": "The meeting it came from",
  "severity": "low | medium | high"
}"#;
