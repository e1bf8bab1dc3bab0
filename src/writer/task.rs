//! Generation tasks: one model call that revises the outline or the document.

use crate::error::WriterError;
use crate::history::ConversationHistory;
use crate::prompts;
use crate::provider::{Backend, ChatMessage};
use crate::roles::TaskRole;
use crate::state::RunState;
use serde::{Deserialize, Serialize};

/// Read-only inputs every task sees. Built once per plan so all tasks share
/// the same pre-plan snapshot.
#[derive(Debug, Clone, Copy)]
pub struct TaskContext<'a> {
    pub history: &'a ConversationHistory,
    pub outline: &'a str,
    pub document: &'a str,
    pub iteration: u32,
}

impl<'a> TaskContext<'a> {
    pub fn new(history: &'a ConversationHistory, state: &'a RunState) -> Self {
        Self {
            history,
            outline: &state.outline,
            document: &state.document,
            iteration: state.iteration,
        }
    }
}

/// Content produced by one task, tagged with its source role and iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutput {
    pub role: TaskRole,
    pub iteration: u32,
    pub content: String,
    pub instruction: String,
}

fn or_placeholder(text: &str) -> &str {
    if text.trim().is_empty() {
        "(not yet created)"
    } else {
        text
    }
}

/// Messages for one task call. Outline tasks never see the document body.
pub fn build_messages(role: TaskRole, ctx: &TaskContext<'_>, instruction: &str) -> Vec<ChatMessage> {
    let history = ctx.history.render();
    let iteration = ctx.iteration.to_string();
    let (system, user) = match role {
        TaskRole::Outline => (
            prompts::OUTLINE_TASK_SYSTEM,
            prompts::render(
                prompts::OUTLINE_TASK_USER,
                &[
                    ("history", history.as_str()),
                    ("outline", or_placeholder(ctx.outline)),
                    ("iteration", iteration.as_str()),
                    ("instruction", instruction),
                ],
            ),
        ),
        TaskRole::Section => (
            prompts::SECTION_TASK_SYSTEM,
            prompts::render(
                prompts::SECTION_TASK_USER,
                &[
                    ("history", history.as_str()),
                    ("outline", or_placeholder(ctx.outline)),
                    ("document", or_placeholder(ctx.document)),
                    ("iteration", iteration.as_str()),
                    ("instruction", instruction),
                ],
            ),
        ),
    };
    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

/// Run one generation task. Backend failures propagate unchanged.
pub async fn generate(
    backend: &Backend,
    role: TaskRole,
    ctx: &TaskContext<'_>,
    instruction: &str,
) -> Result<TaskOutput, WriterError> {
    if instruction.trim().is_empty() {
        return Err(WriterError::EmptyInstruction);
    }
    let purpose = match role {
        TaskRole::Outline => "outline_task",
        TaskRole::Section => "section_task",
    };
    let content = backend
        .post(purpose, build_messages(role, ctx, instruction))
        .await?;
    Ok(TaskOutput {
        role,
        iteration: ctx.iteration,
        content,
        instruction: instruction.to_string(),
    })
}
