//! Parse and validate LLM adjudication output

use crate::error::AlignmentError;
use minimem_domain::{AlignmentVerdict, Contradiction, Severity, VerdictError};
use serde::Deserialize;
use tracing::warn;

/// Shape requested from the model
#[derive(Debug, Deserialize)]
struct RawJudgment {
    aligned: bool,
    #[serde(default)]
    issue: Option<String>,
    #[serde(default)]
    relevant_decision: Option<String>,
    #[serde(default)]
    meeting_title: Option<String>,
    #[serde(default)]
    severity: Option<String>,
}

/// Parse the model's response into a verdict
///
/// Similarity and meeting date are left for the caller to attach from
/// retrieval. A misaligned judgment must carry every detail field with a
/// known severity; an aligned judgment that also carries detail is reduced
/// to a plain aligned verdict.
pub fn parse_judgment(response: &str) -> Result<AlignmentVerdict, AlignmentError> {
    let json_str = extract_json(response)?;
    let raw: RawJudgment = serde_json::from_str(&json_str)?;

    if raw.aligned {
        if raw.issue.is_some()
            || raw.relevant_decision.is_some()
            || raw.meeting_title.is_some()
            || raw.severity.is_some()
        {
            warn!("Aligned judgment carried contradiction detail; discarding it");
        }
        return Ok(AlignmentVerdict::no_contradiction(0.0));
    }

    let contradiction = contradiction_from(raw)
        .map_err(|e| AlignmentError::JudgmentMalformed(e.to_string()))?;
    Ok(AlignmentVerdict::contradiction(contradiction, 0.0))
}

fn contradiction_from(raw: RawJudgment) -> Result<Contradiction, VerdictError> {
    Ok(Contradiction {
        issue: required(raw.issue, "issue")?,
        relevant_decision: required(raw.relevant_decision, "relevant_decision")?,
        meeting_title: required(raw.meeting_title, "meeting_title")?,
        severity: required(raw.severity, "severity")?.parse::<Severity>()?,
    })
}

fn required(value: Option<String>, field: &'static str) -> Result<String, VerdictError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(VerdictError::MissingField(field)),
    }
}

/// Extract JSON from response, handling markdown code blocks
fn extract_json(response: &str) -> Result<String, AlignmentError> {
    let trimmed = response.trim();

    if trimmed.is_empty() {
        return Err(AlignmentError::JudgmentMalformed(
            "Empty response".to_string(),
        ));
    }

    if trimmed.starts_with("```") {
        let lines: Vec<&str> = trimmed.lines().collect();
        if lines.len() < 2 {
            return Err(AlignmentError::JudgmentMalformed(
                "Empty code block".to_string(),
            ));
        }

        // Skip the opening fence, and the closing one when present
        let end = if lines[lines.len() - 1].trim_start().starts_with("```") {
            lines.len() - 1
        } else {
            lines.len()
        };
        Ok(lines[1..end].join("\n"))
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aligned() {
        let verdict = parse_judgment(
            r#"{"aligned": true, "issue": null, "relevant_decision": null, "meeting_title": null, "severity": null}"#,
        )
        .unwrap();

        assert!(verdict.aligned());
        assert!(verdict.issue().is_none());
    }

    #[test]
    fn test_parse_aligned_minimal() {
        let verdict = parse_judgment(r#"{"aligned": true}"#).unwrap();
        assert!(verdict.aligned());
    }

    #[test]
    fn test_parse_misaligned() {
        let verdict = parse_judgment(
            r#"{
                "aligned": false,
                "issue": "Proposes relaunching the mobile app during the enterprise pivot",
                "relevant_decision": "Mobile app redesign is on hold indefinitely",
                "meeting_title": "Q1 All-Hands: Strategic Pivot",
                "severity": "high"
            }"#,
        )
        .unwrap();

        assert!(!verdict.aligned());
        assert_eq!(
            verdict.relevant_decision(),
            Some("Mobile app redesign is on hold indefinitely")
        );
        assert_eq!(verdict.meeting_title(), Some("Q1 All-Hands: Strategic Pivot"));
        assert_eq!(verdict.severity(), Some(Severity::High));
    }

    #[test]
    fn test_severity_case_insensitive() {
        let verdict = parse_judgment(
            r#"{"aligned": false, "issue": "x", "relevant_decision": "y", "meeting_title": "z", "severity": "Medium"}"#,
        )
        .unwrap();
        assert_eq!(verdict.severity(), Some(Severity::Medium));
    }

    #[test]
    fn test_parse_markdown_wrapped() {
        let response = "```json\n{\"aligned\": true}\n```";
        assert!(parse_judgment(response).unwrap().aligned());
    }

    #[test]
    fn test_parse_unterminated_fence() {
        let response = "```\n{\"aligned\": true}";
        assert!(parse_judgment(response).unwrap().aligned());
    }

    #[test]
    fn test_aligned_with_detail_is_normalized() {
        let verdict = parse_judgment(
            r#"{"aligned": true, "issue": "leftover", "relevant_decision": null, "meeting_title": null, "severity": "low"}"#,
        )
        .unwrap();

        assert!(verdict.aligned());
        assert!(verdict.issue().is_none());
        assert!(verdict.severity().is_none());
    }

    #[test]
    fn test_misaligned_missing_field_is_malformed() {
        let result = parse_judgment(
            r#"{"aligned": false, "issue": "x", "relevant_decision": null, "meeting_title": "z", "severity": "low"}"#,
        );
        match result {
            Err(AlignmentError::JudgmentMalformed(msg)) => assert!(msg.contains("relevant_decision")),
            other => panic!("Expected JudgmentMalformed, got {:?}", other),
        }
    }

    #[test]
    fn test_misaligned_blank_field_is_malformed() {
        let result = parse_judgment(
            r#"{"aligned": false, "issue": "  ", "relevant_decision": "y", "meeting_title": "z", "severity": "low"}"#,
        );
        assert!(matches!(result, Err(AlignmentError::JudgmentMalformed(_))));
    }

    #[test]
    fn test_unknown_severity_is_malformed() {
        let result = parse_judgment(
            r#"{"aligned": false, "issue": "x", "relevant_decision": "y", "meeting_title": "z", "severity": "low | medium | high"}"#,
        );
        assert!(matches!(result, Err(AlignmentError::JudgmentMalformed(_))));
    }

    #[test]
    fn test_missing_aligned_is_malformed() {
        let result = parse_judgment(r#"{"issue": null}"#);
        assert!(matches!(result, Err(AlignmentError::JudgmentMalformed(_))));
    }

    #[test]
    fn test_non_boolean_aligned_is_malformed() {
        let result = parse_judgment(r#"{"aligned": "yes"}"#);
        assert!(matches!(result, Err(AlignmentError::JudgmentMalformed(_))));
    }

    #[test]
    fn test_not_json_is_malformed() {
        assert!(matches!(
            parse_judgment("The conversation looks fine to me."),
            Err(AlignmentError::JudgmentMalformed(_))
        ));
        assert!(matches!(
            parse_judgment("   "),
            Err(AlignmentError::JudgmentMalformed(_))
        ));
    }

    #[test]
    fn test_array_is_malformed() {
        assert!(matches!(
            parse_judgment("[]"),
            Err(AlignmentError::JudgmentMalformed(_))
        ));
    }
}
