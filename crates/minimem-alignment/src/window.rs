//! Query construction from the most recent conversation turns

use minimem_domain::ConversationTurn;

/// The trailing slice of a conversation that a check looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversationWindow<'a> {
    turns: &'a [ConversationTurn],
}

impl<'a> ConversationWindow<'a> {
    /// Take the last `size` turns of `history`, or all of them when shorter
    pub fn from_history(history: &'a [ConversationTurn], size: usize) -> Self {
        let start = history.len().saturating_sub(size);
        Self {
            turns: &history[start..],
        }
    }

    /// Turns in chronological order
    pub fn turns(&self) -> &'a [ConversationTurn] {
        self.turns
    }

    /// Number of turns in the window
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// True when the window holds no turns
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// True when at least one turn has non-blank text
    pub fn has_content(&self) -> bool {
        self.turns.iter().any(|turn| !turn.is_blank())
    }

    /// Render as `"{Speaker}: {text}"` lines joined with newlines
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(ConversationTurn::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
