//! Aggregator: folds task outputs back into the run state.
//!
//! Outline candidates are resolved first so the document merge sees the new
//! outline. Nothing is written to [`RunState`] until both fields are resolved.

use crate::error::WriterError;
use crate::history::ConversationHistory;
use crate::prompts;
use crate::provider::{Backend, ChatMessage};
use crate::roles::TaskRole;
use crate::state::RunState;
use crate::writer::task::TaskOutput;
use tracing::{debug, info};

/// How one state field was settled this iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// No candidates; the previous value stands.
    Unchanged,
    /// Exactly one candidate, taken as-is without a merge call.
    PassedThrough,
    /// Several candidates combined by one merge call.
    Merged { candidates: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationReport {
    pub outline: Resolution,
    pub document: Resolution,
    pub stale_dropped: usize,
}

#[derive(Debug, Default)]
pub struct Aggregator;

impl Aggregator {
    pub fn new() -> Self {
        Self
    }

    pub async fn aggregate(
        &self,
        backend: &Backend,
        outputs: Vec<TaskOutput>,
        state: &mut RunState,
        history: &ConversationHistory,
    ) -> Result<AggregationReport, WriterError> {
        let iteration = state.iteration;
        let (current, stale): (Vec<TaskOutput>, Vec<TaskOutput>) = outputs
            .into_iter()
            .partition(|output| output.iteration == iteration);
        for output in &stale {
            debug!(
                iteration,
                output_iteration = output.iteration,
                role = %output.role,
                "Dropping stale task output"
            );
        }

        let (outline_candidates, document_candidates): (Vec<String>, Vec<String>) = {
            let mut outlines = Vec::new();
            let mut documents = Vec::new();
            for output in current {
                match output.role {
                    TaskRole::Outline => outlines.push(output.content),
                    TaskRole::Section => documents.push(output.content),
                }
            }
            (outlines, documents)
        };

        let history_text = history.render();

        let (outline, outline_resolution) = match outline_candidates.len() {
            0 => (state.outline.clone(), Resolution::Unchanged),
            1 => (
                outline_candidates.into_iter().next().unwrap_or_default(),
                Resolution::PassedThrough,
            ),
            n => {
                let candidates = prompts::number_candidates(&outline_candidates);
                let user = prompts::render(
                    prompts::OUTLINE_MERGE_USER,
                    &[
                        ("history", history_text.as_str()),
                        ("existing", state.outline.as_str()),
                        ("candidates", candidates.as_str()),
                    ],
                );
                let merged = backend
                    .post(
                        "outline_merge",
                        vec![
                            ChatMessage::system(prompts::OUTLINE_MERGE_SYSTEM),
                            ChatMessage::user(user),
                        ],
                    )
                    .await?;
                (merged, Resolution::Merged { candidates: n })
            }
        };

        let (document, document_resolution) = match document_candidates.len() {
            0 => (state.document.clone(), Resolution::Unchanged),
            1 => (
                document_candidates.into_iter().next().unwrap_or_default(),
                Resolution::PassedThrough,
            ),
            n => {
                let candidates = prompts::number_candidates(&document_candidates);
                let user = prompts::render(
                    prompts::DOCUMENT_MERGE_USER,
                    &[
                        ("history", history_text.as_str()),
                        ("outline", outline.as_str()),
                        ("existing", state.document.as_str()),
                        ("candidates", candidates.as_str()),
                    ],
                );
                let merged = backend
                    .post(
                        "document_merge",
                        vec![
                            ChatMessage::system(prompts::DOCUMENT_MERGE_SYSTEM),
                            ChatMessage::user(user),
                        ],
                    )
                    .await?;
                (merged, Resolution::Merged { candidates: n })
            }
        };

        state.commit(outline, document);

        let report = AggregationReport {
            outline: outline_resolution,
            document: document_resolution,
            stale_dropped: stale.len(),
        };
        info!(
            iteration,
            outline = ?report.outline,
            document = ?report.document,
            stale_dropped = report.stale_dropped,
            words = state.word_count(),
            "Aggregation complete"
        );
        Ok(report)
    }
}
