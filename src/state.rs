//! Run State: the single mutable record carried across iterations and turns.

use serde::{Deserialize, Serialize};

/// Per-session writing state.
///
/// Created empty, mutated only by the loop driver (iteration counter) and the
/// aggregator (outline and document, via [`RunState::commit`]). It survives
/// across top-level turns so follow-up requests build on earlier output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    pub iteration: u32,
    pub outline: String,
    pub document: String,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number the next planner call. Returns the new iteration.
    pub fn begin_iteration(&mut self) -> u32 {
        self.iteration += 1;
        self.iteration
    }

    /// Replace outline and document together.
    pub fn commit(&mut self, outline: String, document: String) {
        self.outline = outline;
        self.document = document;
    }

    pub fn word_count(&self) -> usize {
        self.document.split_whitespace().count()
    }
}
