//! CLI output: document rendering and error mapping.

use crate::error::WriterError;
use crate::state::RunState;
use crate::writer::TaskFailure;

/// Map domain errors to a string for CLI output.
pub fn map_error(e: &WriterError) -> String {
    match e {
        WriterError::ProviderNotConfigured(_) | WriterError::ProviderAuthFailed(_) => format!(
            "{}\nCheck the [provider] section of quill.toml or the provider's API key variable.",
            e
        ),
        _ => e.to_string(),
    }
}

/// A finished document as a fenced markdown block.
pub fn format_complete(document: &str) -> String {
    format!("```markdown\n{}\n```", document.trim_end())
}

/// Partial results left behind when the budget ran out.
pub fn format_pending(state: &RunState) -> String {
    format!(
        "Execution stopped due to exceeded budget. Consider increasing the budget for future runs.\n\
         Intermediate results:\n\n\
         Outline:\n{}\n\n\
         ----------------------------------------------------------\n\n\
         Article:\n{}",
        state.outline, state.document
    )
}

/// Tasks skipped during a turn, one line each.
pub fn format_task_failures(failures: &[TaskFailure]) -> String {
    let mut text = format!(
        "Warning: {} task(s) failed and were skipped:",
        failures.len()
    );
    for failure in failures {
        text.push_str(&format!(
            "\n- {} \"{}\": {}",
            failure.role, failure.instruction, failure.message
        ));
    }
    text
}
