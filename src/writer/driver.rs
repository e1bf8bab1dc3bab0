//! Loop driver: runs one top-level turn through the writing state machine.
//!
//! A turn starts in `Planning` when a user message arrives and cycles
//! `Planning → Executing → Aggregating → Judging` until the judge or the
//! per-turn iteration cap ends it. The session keeps history and run state
//! between turns, so follow-up requests revise the previous document.

use crate::error::WriterError;
use crate::history::ConversationHistory;
use crate::provider::Backend;
use crate::roles::RoleRegistry;
use crate::state::RunState;
use crate::writer::aggregator::Aggregator;
use crate::writer::executor::{PlanExecutor, TaskFailure};
use crate::writer::judge::{ContinuationJudge, Judgement, Verdict};
use crate::writer::plan::ExecutionPlan;
use crate::writer::planner::Planner;
use crate::writer::task::TaskOutput;
use crate::writer::WriterConfig;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Caller-supplied limits for one turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunBudget {
    pub time: Option<Duration>,
    /// Backend calls, retries included.
    pub max_calls: Option<u32>,
}

impl RunBudget {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn from_config(config: &WriterConfig) -> Self {
        Self {
            time: config.budget_secs.map(Duration::from_secs),
            max_calls: config.max_calls,
        }
    }

    pub fn with_time(mut self, time: Duration) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_max_calls(mut self, max_calls: u32) -> Self {
        self.max_calls = Some(max_calls);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The finished document, also appended to history.
    Complete(String),
    /// The budget ran out first. The last committed state is still readable.
    Pending,
}

#[derive(Debug, Clone)]
pub struct TurnReport {
    pub outcome: TurnOutcome,
    /// Planner iterations started during this turn.
    pub iterations: u32,
    pub calls_used: u32,
    /// Last judge decision; `None` when the turn ended before judging.
    pub judgement: Option<Judgement>,
    /// Tasks skipped under `TaskFailurePolicy::Isolate`, across all iterations.
    pub task_failures: Vec<TaskFailure>,
}

impl TurnReport {
    pub fn document(&self) -> Option<&str> {
        match &self.outcome {
            TurnOutcome::Complete(document) => Some(document),
            TurnOutcome::Pending => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.outcome == TurnOutcome::Pending
    }
}

enum LoopPhase {
    Planning,
    Executing(ExecutionPlan),
    Aggregating(Vec<TaskOutput>),
    Judging,
    Done(Judgement),
}

impl LoopPhase {
    fn name(&self) -> &'static str {
        match self {
            LoopPhase::Planning => "planning",
            LoopPhase::Executing(_) => "executing",
            LoopPhase::Aggregating(_) => "aggregating",
            LoopPhase::Judging => "judging",
            LoopPhase::Done(_) => "done",
        }
    }
}

/// Await `fut`, failing with `BudgetExhausted` once `deadline` passes.
async fn within<T, F>(deadline: Option<Instant>, stage: &str, fut: F) -> Result<T, WriterError>
where
    F: Future<Output = Result<T, WriterError>>,
{
    let Some(deadline) = deadline else {
        return fut.await;
    };
    if Instant::now() >= deadline {
        return Err(WriterError::BudgetExhausted(format!(
            "time budget spent before {}",
            stage
        )));
    }
    match tokio::time::timeout_at(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(WriterError::BudgetExhausted(format!(
            "time budget spent during {}",
            stage
        ))),
    }
}

/// One writing conversation: history, run state, and the loop components.
pub struct WritingSession {
    backend: Backend,
    config: WriterConfig,
    history: ConversationHistory,
    state: RunState,
    planner: Planner,
    executor: PlanExecutor,
    aggregator: Aggregator,
    judge: ContinuationJudge,
}

impl WritingSession {
    pub fn new(backend: Backend, config: WriterConfig) -> Self {
        let planner = Planner::new(RoleRegistry::standard())
            .with_limits(config.priority_threshold, config.max_plan_size)
            .with_min_word_count(config.min_word_count);
        let executor = PlanExecutor::new(config.max_concurrent_tasks, config.task_failure_policy);
        let judge = ContinuationJudge::new(config.min_word_count, config.judge_retries);
        Self {
            backend,
            config,
            history: ConversationHistory::new(),
            state: RunState::new(),
            planner,
            executor,
            aggregator: Aggregator::new(),
            judge,
        }
    }

    /// Resume from previously saved run state.
    pub fn with_state(mut self, state: RunState) -> Self {
        self.state = state;
        self
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Handle one top-level user message.
    ///
    /// Backend failures are returned as errors. Budget exhaustion is not an
    /// error: it yields [`TurnOutcome::Pending`] and leaves history untouched
    /// apart from the user message.
    pub async fn handle(
        &mut self,
        message: &str,
        budget: RunBudget,
    ) -> Result<TurnReport, WriterError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(WriterError::EmptyRequest);
        }

        self.history.push_user(message);
        self.backend.meter().reset(budget.max_calls);
        let deadline = budget.time.map(|time| Instant::now() + time);
        let turn_start = self.state.iteration;
        let iteration_limit = turn_start
            .saturating_add(self.config.max_extra_iterations)
            .saturating_add(1);

        info!(
            turn_start,
            iteration_limit,
            time_budget_ms = budget.time.map(|t| t.as_millis() as u64),
            max_calls = budget.max_calls,
            "Turn started"
        );

        let mut task_failures = Vec::new();
        let result = self
            .run_loop(deadline, iteration_limit, &mut task_failures)
            .await;
        let iterations = self.state.iteration - turn_start;
        let calls_used = self.backend.meter().used();

        match result {
            Ok(judgement) => {
                let document = self.state.document.clone();
                self.history.push_agent(document.clone());
                if task_failures.is_empty() {
                    info!(
                        iterations,
                        calls_used,
                        words = self.state.word_count(),
                        "Turn complete"
                    );
                } else {
                    warn!(
                        iterations,
                        calls_used,
                        failed_tasks = task_failures.len(),
                        "Turn complete with skipped tasks"
                    );
                }
                Ok(TurnReport {
                    outcome: TurnOutcome::Complete(document),
                    iterations,
                    calls_used,
                    judgement: Some(judgement),
                    task_failures,
                })
            }
            Err(err) if err.is_budget_exhausted() => {
                warn!(
                    iterations,
                    calls_used,
                    error = %err,
                    "Budget exhausted, returning pending"
                );
                Ok(TurnReport {
                    outcome: TurnOutcome::Pending,
                    iterations,
                    calls_used,
                    judgement: None,
                    task_failures,
                })
            }
            Err(err) => Err(err),
        }
    }

    async fn run_loop(
        &mut self,
        deadline: Option<Instant>,
        iteration_limit: u32,
        task_failures: &mut Vec<TaskFailure>,
    ) -> Result<Judgement, WriterError> {
        let mut phase = LoopPhase::Planning;
        loop {
            phase = match phase {
                LoopPhase::Planning => {
                    self.state.begin_iteration();
                    let plan = within(
                        deadline,
                        "planning",
                        self.planner.plan(&self.backend, &self.history, &self.state),
                    )
                    .await?;
                    LoopPhase::Executing(plan)
                }
                LoopPhase::Executing(plan) => {
                    let report = within(
                        deadline,
                        "execution",
                        self.executor
                            .run(&self.backend, &plan, &self.history, &self.state),
                    )
                    .await?;
                    task_failures.extend(report.failures);
                    LoopPhase::Aggregating(report.outputs)
                }
                LoopPhase::Aggregating(outputs) => {
                    within(
                        deadline,
                        "aggregation",
                        self.aggregator.aggregate(
                            &self.backend,
                            outputs,
                            &mut self.state,
                            &self.history,
                        ),
                    )
                    .await?;
                    LoopPhase::Judging
                }
                LoopPhase::Judging => {
                    let judgement = within(
                        deadline,
                        "judging",
                        self.judge.judge(
                            &self.backend,
                            &self.state,
                            &self.history,
                            iteration_limit,
                        ),
                    )
                    .await?;
                    match judgement.verdict {
                        Verdict::Continue => LoopPhase::Planning,
                        Verdict::Done => LoopPhase::Done(judgement),
                    }
                }
                LoopPhase::Done(judgement) => return Ok(judgement),
            };
            debug!(
                iteration = self.state.iteration,
                phase = phase.name(),
                "Loop phase"
            );
        }
    }
}
