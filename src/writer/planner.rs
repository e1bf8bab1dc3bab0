//! Planner: asks the model for a prioritized list of delegated tasks.

use crate::error::WriterError;
use crate::history::ConversationHistory;
use crate::prompts;
use crate::provider::{Backend, ChatMessage};
use crate::roles::RoleRegistry;
use crate::state::RunState;
use crate::writer::plan::{build_plan, parse_plan_response, ExecutionPlan};
use crate::writer::WriterConfig;
use tracing::{debug, info, warn};

pub struct Planner {
    registry: RoleRegistry,
    priority_threshold: i32,
    max_plan_size: usize,
    min_word_count: usize,
}

impl Planner {
    /// Planner with the session defaults of [`WriterConfig`].
    pub fn new(registry: RoleRegistry) -> Self {
        let defaults = WriterConfig::default();
        Self {
            registry,
            priority_threshold: defaults.priority_threshold,
            max_plan_size: defaults.max_plan_size,
            min_word_count: defaults.min_word_count,
        }
    }

    pub fn with_limits(mut self, priority_threshold: i32, max_plan_size: usize) -> Self {
        self.priority_threshold = priority_threshold;
        self.max_plan_size = max_plan_size;
        self
    }

    pub fn with_min_word_count(mut self, min_word_count: usize) -> Self {
        self.min_word_count = min_word_count;
        self
    }

    pub fn build_messages(&self, history: &ConversationHistory, state: &RunState) -> Vec<ChatMessage> {
        let roles = self.registry.describe();
        let history = history.render();
        let min_words = self.min_word_count.to_string();
        let user = prompts::render(
            prompts::PLANNER_USER,
            &[
                ("roles", roles.as_str()),
                ("history", history.as_str()),
                ("outline", state.outline.as_str()),
                ("document", state.document.as_str()),
                ("min_words", min_words.as_str()),
            ],
        );
        vec![ChatMessage::system(prompts::PLANNER_SYSTEM), ChatMessage::user(user)]
    }

    /// Plan the iteration `state.iteration`, which the caller has already
    /// advanced for this call.
    pub async fn plan(
        &self,
        backend: &Backend,
        history: &ConversationHistory,
        state: &RunState,
    ) -> Result<ExecutionPlan, WriterError> {
        let response = backend
            .post("planner", self.build_messages(history, state))
            .await?;
        debug!(iteration = state.iteration, response = %response, "Planner response");

        let parsed = parse_plan_response(&response, &self.registry);
        for (line, err) in &parsed.rejected {
            warn!(iteration = state.iteration, line = %line, error = %err, "Dropping plan line");
        }

        let proposed = parsed.invocations.len();
        let plan = build_plan(
            state.iteration,
            parsed.invocations,
            self.priority_threshold,
            self.max_plan_size,
        );
        info!(
            iteration = state.iteration,
            proposed,
            rejected = parsed.rejected.len(),
            planned = plan.len(),
            priorities = ?plan.priorities(),
            "Execution plan ready"
        );
        Ok(plan)
    }
}
