//! Plan executor: runs every invocation of a plan against one shared snapshot.
//! Tasks fan out concurrently but outputs come back in plan order.

use crate::error::WriterError;
use crate::history::ConversationHistory;
use crate::provider::Backend;
use crate::roles::TaskRole;
use crate::state::RunState;
use crate::writer::plan::ExecutionPlan;
use crate::writer::task::{self, TaskContext, TaskOutput};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// What a failing task does to the rest of the iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskFailurePolicy {
    /// Any task failure fails the whole turn.
    #[default]
    FailRun,
    /// Failed tasks are recorded and skipped; the rest are aggregated.
    Isolate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    pub role: TaskRole,
    pub instruction: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ExecutionReport {
    pub outputs: Vec<TaskOutput>,
    pub failures: Vec<TaskFailure>,
}

pub struct PlanExecutor {
    max_concurrent: usize,
    failure_policy: TaskFailurePolicy,
}

impl PlanExecutor {
    pub fn new(max_concurrent: usize, failure_policy: TaskFailurePolicy) -> Self {
        Self {
            max_concurrent: max_concurrent.max(1),
            failure_policy,
        }
    }

    /// Run every invocation with `state` as the read-only snapshot.
    ///
    /// Budget exhaustion always aborts, whatever the failure policy.
    pub async fn run(
        &self,
        backend: &Backend,
        plan: &ExecutionPlan,
        history: &ConversationHistory,
        state: &RunState,
    ) -> Result<ExecutionReport, WriterError> {
        let mut report = ExecutionReport::default();
        if plan.is_empty() {
            return Ok(report);
        }

        let ctx = TaskContext::new(history, state);
        info!(
            iteration = ctx.iteration,
            tasks = plan.len(),
            max_concurrent = self.max_concurrent,
            "Executing plan"
        );

        let mut results = stream::iter(plan.invocations.iter().map(|invocation| async move {
            info!(
                iteration = ctx.iteration,
                role = %invocation.role,
                priority = invocation.priority,
                instruction = %invocation.instruction,
                "Task started"
            );
            let outcome =
                task::generate(backend, invocation.role, &ctx, &invocation.instruction).await;
            (invocation, outcome)
        }))
        .buffered(self.max_concurrent);

        while let Some((invocation, outcome)) = results.next().await {
            match outcome {
                Ok(output) => {
                    info!(
                        iteration = output.iteration,
                        role = %output.role,
                        content_chars = output.content.chars().count(),
                        "Task completed"
                    );
                    report.outputs.push(output);
                }
                Err(err) => {
                    warn!(
                        iteration = ctx.iteration,
                        role = %invocation.role,
                        instruction = %invocation.instruction,
                        error = %err,
                        "Task failed"
                    );
                    if err.is_budget_exhausted()
                        || self.failure_policy == TaskFailurePolicy::FailRun
                    {
                        return Err(WriterError::TaskFailed {
                            role: invocation.role,
                            instruction: invocation.instruction.clone(),
                            source: Box::new(err),
                        });
                    }
                    report.failures.push(TaskFailure {
                        role: invocation.role,
                        instruction: invocation.instruction.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }
}
