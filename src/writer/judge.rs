//! Continuation judge: decides whether another iteration is needed.

use crate::error::WriterError;
use crate::history::ConversationHistory;
use crate::prompts;
use crate::provider::{Backend, ChatMessage};
use crate::state::RunState;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Continue,
    Done,
}

/// What a single judge reply said.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JudgeReading {
    KeepEditing,
    Return,
    Unparseable,
}

/// Read the markers out of a judge reply. "KEEP EDITING" wins when both
/// markers appear.
pub fn read_verdict(text: &str) -> JudgeReading {
    if text.contains(prompts::KEEP_EDITING) {
        JudgeReading::KeepEditing
    } else if text.contains(prompts::RETURN_TO_REQUESTER) {
        JudgeReading::Return
    } else {
        JudgeReading::Unparseable
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Judgement {
    pub verdict: Verdict,
    /// Reading of the last judge reply.
    pub reading: JudgeReading,
    /// True when the iteration cap overrode a continue reading.
    pub forced_by_cap: bool,
}

pub struct ContinuationJudge {
    min_word_count: usize,
    retries: u32,
}

impl ContinuationJudge {
    pub fn new(min_word_count: usize, retries: u32) -> Self {
        Self {
            min_word_count,
            retries,
        }
    }

    pub fn build_messages(&self, state: &RunState, history: &ConversationHistory) -> Vec<ChatMessage> {
        let min_words = self.min_word_count.to_string();
        let history = history.render();
        let user = prompts::render(
            prompts::JUDGE_USER,
            &[
                ("min_words", min_words.as_str()),
                ("outline", state.outline.as_str()),
                ("document", state.document.as_str()),
                ("history", history.as_str()),
            ],
        );
        vec![ChatMessage::system(prompts::JUDGE_SYSTEM), ChatMessage::user(user)]
    }

    /// Ask the judge about the current state.
    ///
    /// The call is always made. Once `state.iteration` reaches
    /// `iteration_limit` the verdict is DONE regardless of the reply. A reply
    /// with neither marker is re-asked up to `retries` times, then treated as
    /// DONE.
    pub async fn judge(
        &self,
        backend: &Backend,
        state: &RunState,
        history: &ConversationHistory,
        iteration_limit: u32,
    ) -> Result<Judgement, WriterError> {
        let mut messages = self.build_messages(state, history);
        let mut reply = backend.post("judge", messages.clone()).await?;
        let mut reading = read_verdict(&reply);

        let mut asked_again = 0;
        while reading == JudgeReading::Unparseable && asked_again < self.retries {
            asked_again += 1;
            warn!(
                iteration = state.iteration,
                attempt = asked_again,
                "Judge reply carried no decision, asking again"
            );
            messages.push(ChatMessage::assistant(reply));
            messages.push(ChatMessage::user(prompts::JUDGE_CLARIFY));
            reply = backend.post("judge", messages.clone()).await?;
            reading = read_verdict(&reply);
        }

        let at_cap = state.iteration >= iteration_limit;
        let verdict = match reading {
            JudgeReading::KeepEditing if !at_cap => Verdict::Continue,
            JudgeReading::KeepEditing | JudgeReading::Return => Verdict::Done,
            JudgeReading::Unparseable => {
                warn!(
                    iteration = state.iteration,
                    "Judge never reached a decision, returning the document"
                );
                Verdict::Done
            }
        };
        let forced_by_cap = at_cap && reading == JudgeReading::KeepEditing;

        info!(
            iteration = state.iteration,
            iteration_limit,
            reading = ?reading,
            verdict = ?verdict,
            forced_by_cap,
            words = state.word_count(),
            "Judge verdict"
        );
        Ok(Judgement {
            verdict,
            reading,
            forced_by_cap,
        })
    }
}
