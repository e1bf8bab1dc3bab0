//! Writing loop: planner, executor, aggregator, judge, and the driver that
//! sequences them.
//!
//! One turn runs `PLANNING → EXECUTING → AGGREGATING → JUDGING` until the judge
//! (or the iteration cap) says the document is done. Every stage reaches the
//! model through [`crate::provider::Backend`]; only the aggregator writes
//! outline and document back into [`crate::state::RunState`].

pub mod aggregator;
pub mod driver;
pub mod executor;
pub mod judge;
pub mod plan;
pub mod planner;
pub mod task;

pub use aggregator::{AggregationReport, Aggregator, Resolution};
pub use driver::{RunBudget, TurnOutcome, TurnReport, WritingSession};
pub use executor::{ExecutionReport, PlanExecutor, TaskFailure, TaskFailurePolicy};
pub use judge::{ContinuationJudge, JudgeReading, Judgement, Verdict};
pub use plan::{build_plan, parse_plan_line, parse_plan_response, ExecutionPlan, TaskInvocation};
pub use planner::Planner;
pub use task::{TaskContext, TaskOutput};

use serde::{Deserialize, Serialize};

/// Tuning for one writing session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriterConfig {
    /// Invocations must score strictly above this to run.
    #[serde(default)]
    pub priority_threshold: i32,

    /// Maximum invocations kept per plan after sorting.
    #[serde(default = "default_max_plan_size")]
    pub max_plan_size: usize,

    /// Iterations allowed after the first one in a single turn.
    #[serde(default = "default_max_extra_iterations")]
    pub max_extra_iterations: u32,

    /// Length threshold quoted to the planner and the judge.
    #[serde(default = "default_min_word_count")]
    pub min_word_count: usize,

    /// Times an undecided judge is asked again before failing open.
    #[serde(default = "default_judge_retries")]
    pub judge_retries: u32,

    #[serde(default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: usize,

    #[serde(default)]
    pub task_failure_policy: TaskFailurePolicy,

    /// Wall-clock budget per turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_secs: Option<u64>,

    /// Backend call budget per turn, retries included.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_calls: Option<u32>,
}

fn default_max_plan_size() -> usize {
    5
}

fn default_max_extra_iterations() -> u32 {
    2
}

fn default_min_word_count() -> usize {
    1500
}

fn default_judge_retries() -> u32 {
    1
}

fn default_max_concurrent_tasks() -> usize {
    5
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            priority_threshold: 0,
            max_plan_size: default_max_plan_size(),
            max_extra_iterations: default_max_extra_iterations(),
            min_word_count: default_min_word_count(),
            judge_retries: default_judge_retries(),
            max_concurrent_tasks: default_max_concurrent_tasks(),
            task_failure_policy: TaskFailurePolicy::default(),
            budget_secs: None,
            max_calls: None,
        }
    }
}

impl WriterConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_plan_size == 0 {
            return Err("max_plan_size must be at least 1".to_string());
        }
        if self.max_concurrent_tasks == 0 {
            return Err("max_concurrent_tasks must be at least 1".to_string());
        }
        if self.budget_secs == Some(0) {
            return Err("budget_secs must be positive when set".to_string());
        }
        Ok(())
    }
}
