//! Task Role Registry
//!
//! The fixed set of generation roles the planner may delegate to. Role names
//! arrive as free text from the planner's response, so lookup fails closed:
//! an unknown name is a parse error for that line, never a crash.

use crate::error::PlanLineError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A category of generation task bound to one generation routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskRole {
    /// Writes or revises the outline (section headers only).
    Outline,
    /// Writes or revises the document body.
    Section,
}

impl TaskRole {
    pub const ALL: [TaskRole; 2] = [TaskRole::Outline, TaskRole::Section];

    /// Name the planner must echo back in its `role;priority;instruction` lines.
    pub fn name(self) -> &'static str {
        match self {
            TaskRole::Outline => "Outline Writer",
            TaskRole::Section => "Section Writer",
        }
    }

    /// Description shown to the planner; only ever used inside its prompt.
    pub fn description(self) -> &'static str {
        match self {
            TaskRole::Outline => {
                "Write or revise the outline (i.e. section headers) of a research article in \
                 markdown format. Always give this role the highest score when there should be \
                 structural changes to the article (e.g. new sections)."
            }
            TaskRole::Section => {
                "Write or revise specific section bodies of a research article in markdown \
                 format. Use this role to write the main research article content."
            }
        }
    }
}

impl fmt::Display for TaskRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable registry of the roles available to one writing session.
#[derive(Debug, Clone)]
pub struct RoleRegistry {
    roles: Vec<TaskRole>,
}

impl RoleRegistry {
    /// The outline + section registry.
    pub fn standard() -> Self {
        Self {
            roles: TaskRole::ALL.to_vec(),
        }
    }

    /// Resolve a role by the name the planner produced.
    pub fn lookup(&self, name: &str) -> Result<TaskRole, PlanLineError> {
        let name = name.trim();
        self.roles
            .iter()
            .copied()
            .find(|role| role.name() == name)
            .ok_or_else(|| PlanLineError::UnknownRole(name.to_string()))
    }

    /// One `name: ..., description: ...` line per role, for the planner prompt.
    pub fn describe(&self) -> String {
        self.roles
            .iter()
            .map(|role| format!("name: {}, description: {}", role.name(), role.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
