//! CLI domain: parse, route, and output only.
//! Writing orchestration lives in `crate::writer`; routes just drive a session.

mod output;
mod parse;
mod route;

pub use output::{format_complete, format_pending, format_task_failures, map_error};
pub use parse::{Cli, Commands};
pub use route::{run_chat, CommandOutcome, RunContext, DEFAULT_REQUEST, EXIT_PENDING};
