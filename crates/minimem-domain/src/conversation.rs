//! Conversation turns supplied by the caller on every check

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Who said a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// The human user
    User,

    /// The simulated teammate
    #[serde(alias = "assistant", alias = "ai")]
    Teammate,

    /// System messages
    System,
}

impl Speaker {
    /// Capitalized label used when rendering a turn
    pub fn label(&self) -> &'static str {
        match self {
            Speaker::User => "User",
            Speaker::Teammate => "Teammate",
            Speaker::System => "System",
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Speaker {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "user" => Ok(Speaker::User),
            "teammate" | "assistant" | "ai" => Ok(Speaker::Teammate),
            "system" => Ok(Speaker::System),
            other => Err(format!("Unknown speaker: {}", other)),
        }
    }
}

/// A single message in the conversation being checked
///
/// The wire names are `speaker`/`text`; `sender`/`content` are accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Who said it
    #[serde(alias = "sender")]
    pub speaker: Speaker,

    /// What was said
    #[serde(alias = "content")]
    pub text: String,
}

impl ConversationTurn {
    /// Create a turn
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }

    /// A user turn
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Speaker::User, text)
    }

    /// A teammate turn
    pub fn teammate(text: impl Into<String>) -> Self {
        Self::new(Speaker::Teammate, text)
    }

    /// A system turn
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Speaker::System, text)
    }

    /// Render as `"{Speaker}: {text}"`
    pub fn render(&self) -> String {
        format!("{}: {}", self.speaker.label(), self.text)
    }

    /// True when the text carries nothing to embed
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_capitalizes_speaker() {
        assert_eq!(ConversationTurn::user("hi").render(), "User: hi");
        assert_eq!(ConversationTurn::teammate("hey").render(), "Teammate: hey");
        assert_eq!(ConversationTurn::system("note").render(), "System: note");
    }

    #[test]
    fn test_speaker_parsing() {
        assert_eq!("USER".parse::<Speaker>().unwrap(), Speaker::User);
        assert_eq!("assistant".parse::<Speaker>().unwrap(), Speaker::Teammate);
        assert_eq!(" system ".parse::<Speaker>().unwrap(), Speaker::System);
        assert!("robot".parse::<Speaker>().is_err());
    }

    #[test]
    fn test_deserialize_legacy_field_names() {
        let json = r#"[{"sender": "user", "content": "hello"}, {"speaker": "ai", "text": "hi"}]"#;
        let turns: Vec<ConversationTurn> = serde_json::from_str(json).unwrap();

        assert_eq!(turns[0], ConversationTurn::user("hello"));
        assert_eq!(turns[1], ConversationTurn::teammate("hi"));
    }

    #[test]
    fn test_blank_detection() {
        assert!(ConversationTurn::user("   \n").is_blank());
        assert!(!ConversationTurn::user("ok").is_blank());
    }
}
