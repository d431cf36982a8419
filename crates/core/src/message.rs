//! Conversation domain types.
//!
//! The history is the model-facing log: every user question and assistant
//! answer in submission order. Prompts read only a trailing window of it.

use serde::{Deserialize, Serialize};

/// Default number of trailing turns included in a prompt.
pub const DEFAULT_HISTORY_WINDOW: usize = 8;

/// The role of a turn in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The AI assistant
    Assistant,
}

impl Role {
    /// Speaker label used in prompt transcripts.
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

/// A single exchange entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Append-only conversation log with a read window.
///
/// Nothing is ever evicted; `recent()` simply exposes the last `window` turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationHistory {
    turns: Vec<ConversationTurn>,
    window: usize,
}

impl ConversationHistory {
    pub fn new(window: usize) -> Self {
        Self {
            turns: Vec::new(),
            window,
        }
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    /// The trailing turns that go into a prompt, oldest first.
    pub fn recent(&self) -> &[ConversationTurn] {
        let start = self.turns.len().saturating_sub(self.window);
        &self.turns[start..]
    }

    /// Every turn ever appended, oldest first.
    pub fn all(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_WINDOW)
    }
}
