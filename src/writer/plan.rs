use crate::error::PlanLineError;
use crate::roles::{RoleRegistry, TaskRole};
use serde::{Deserialize, Serialize};

/// One delegated unit of work proposed by the planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInvocation {
    pub role: TaskRole,
    pub priority: i32,
    pub instruction: String,
}

/// Ordered batch of invocations produced by one planner call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub iteration: u32,
    pub invocations: Vec<TaskInvocation>,
}

impl ExecutionPlan {
    pub fn empty(iteration: u32) -> Self {
        Self {
            iteration,
            invocations: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.invocations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.invocations.len()
    }

    pub fn priorities(&self) -> Vec<i32> {
        self.invocations.iter().map(|inv| inv.priority).collect()
    }
}

/// Parse one `role;priority;instruction` line.
///
/// Only the first two semicolons split; any further semicolons belong to the
/// instruction.
pub fn parse_plan_line(
    line: &str,
    registry: &RoleRegistry,
) -> Result<TaskInvocation, PlanLineError> {
    let fields: Vec<&str> = line.splitn(3, ';').collect();
    let [role, priority, instruction] = fields[..] else {
        return Err(PlanLineError::WrongFieldCount {
            found: fields.len(),
        });
    };

    let role = registry.lookup(role)?;
    let priority = priority
        .trim()
        .parse::<i32>()
        .map_err(|_| PlanLineError::InvalidPriority(priority.trim().to_string()))?;
    let instruction = instruction.trim();
    if instruction.is_empty() {
        return Err(PlanLineError::EmptyInstruction);
    }

    Ok(TaskInvocation {
        role,
        priority,
        instruction: instruction.to_string(),
    })
}

/// Result of parsing a whole planner response.
#[derive(Debug, Clone, Default)]
pub struct PlanParse {
    pub invocations: Vec<TaskInvocation>,
    pub rejected: Vec<(String, PlanLineError)>,
}

/// Parse every non-empty line; bad lines are collected, never fatal.
pub fn parse_plan_response(response: &str, registry: &RoleRegistry) -> PlanParse {
    let mut parsed = PlanParse::default();
    for line in response.lines().filter(|line| !line.trim().is_empty()) {
        match parse_plan_line(line, registry) {
            Ok(invocation) => parsed.invocations.push(invocation),
            Err(err) => parsed.rejected.push((line.to_string(), err)),
        }
    }
    parsed
}

/// Keep invocations scoring above `threshold`, highest first, at most `max_size`.
///
/// The sort is stable, so equal priorities keep response order.
pub fn build_plan(
    iteration: u32,
    invocations: Vec<TaskInvocation>,
    threshold: i32,
    max_size: usize,
) -> ExecutionPlan {
    let mut kept: Vec<TaskInvocation> = invocations
        .into_iter()
        .filter(|inv| inv.priority > threshold)
        .collect();
    kept.sort_by(|a, b| b.priority.cmp(&a.priority));
    kept.truncate(max_size);
    ExecutionPlan {
        iteration,
        invocations: kept,
    }
}
