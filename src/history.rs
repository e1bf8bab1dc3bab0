//! Conversation history shared read-only by every stage of the loop.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    User,
    Agent,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::User => f.write_str("user"),
            MessageKind::Agent => f.write_str("agent"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub kind: MessageKind,
    pub text: String,
}

/// Append-only record of top-level requests and accepted documents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationHistory {
    entries: Vec<HistoryEntry>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.entries.push(HistoryEntry {
            kind: MessageKind::User,
            text: text.into(),
        });
    }

    pub fn push_agent(&mut self, text: impl Into<String>) {
        self.entries.push(HistoryEntry {
            kind: MessageKind::Agent,
            text: text.into(),
        });
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last_user(&self) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.kind == MessageKind::User)
            .map(|entry| entry.text.as_str())
    }

    /// `kind: text` per entry, in order, for prompt embedding.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|entry| format!("{}: {}", entry.kind, entry.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
