//! CLI route: run context and the command table.

use crate::cli::output::{format_complete, format_pending, format_task_failures, map_error};
use crate::cli::parse::Commands;
use crate::config::{ConfigLoader, QuillConfig};
use crate::error::WriterError;
use crate::provider::Backend;
use crate::writer::{RunBudget, TurnOutcome, TurnReport, WritingSession};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{error, info};

/// Used by `chat` when the user submits an empty line.
pub const DEFAULT_REQUEST: &str = "Tell me about the history of box manufacturing.";

/// Process exit code for a turn that ran out of budget.
pub const EXIT_PENDING: i32 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub output: String,
    pub exit_code: i32,
}

impl CommandOutcome {
    fn success(output: String) -> Self {
        Self {
            output,
            exit_code: 0,
        }
    }
}

/// Runtime context for CLI execution: workspace and effective configuration.
pub struct RunContext {
    config: QuillConfig,
    workspace_root: PathBuf,
}

impl RunContext {
    /// Load configuration from `config_path` if given, otherwise from the
    /// layered sources rooted at `workspace_root`.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, WriterError> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        Ok(Self::from_config(workspace_root, config))
    }

    pub fn from_config(workspace_root: PathBuf, config: QuillConfig) -> Self {
        Self {
            config,
            workspace_root,
        }
    }

    /// CLI budget flags win over configured budgets.
    pub fn with_budget_overrides(mut self, budget_secs: Option<u64>, max_calls: Option<u32>) -> Self {
        if budget_secs.is_some() {
            self.config.writer.budget_secs = budget_secs;
        }
        if max_calls.is_some() {
            self.config.writer.max_calls = max_calls;
        }
        self
    }

    pub fn config(&self) -> &QuillConfig {
        &self.config
    }

    pub fn budget(&self) -> RunBudget {
        RunBudget::from_config(&self.config.writer)
    }

    fn session(&self) -> Result<WritingSession, WriterError> {
        self.config.ensure_valid()?;
        let backend = Backend::from_config(&self.config.provider)?;
        Ok(WritingSession::new(backend, self.config.writer.clone()))
    }

    /// Execute a CLI command via the route table.
    pub async fn execute(&self, command: &Commands) -> Result<CommandOutcome, WriterError> {
        info!(workspace = %self.workspace_root.display(), command = ?command, "Executing command");
        match command {
            Commands::Config => Ok(CommandOutcome::success(self.config.to_toml_redacted()?)),
            Commands::Write { request } => {
                let mut session = self.session()?;
                write_once(&mut session, &request.join(" "), self.budget()).await
            }
            Commands::Chat => {
                let mut session = self.session()?;
                let stdin = BufReader::new(tokio::io::stdin());
                run_chat(&mut session, stdin, std::io::stdout(), self.budget()).await?;
                Ok(CommandOutcome::success(String::new()))
            }
        }
    }
}

/// One turn, rendered for `quill write`.
pub async fn write_once(
    session: &mut WritingSession,
    request: &str,
    budget: RunBudget,
) -> Result<CommandOutcome, WriterError> {
    let report = session.handle(request, budget).await?;
    let (mut output, exit_code) = match &report.outcome {
        TurnOutcome::Complete(document) => (document.clone(), 0),
        TurnOutcome::Pending => (format_pending(session.state()), EXIT_PENDING),
    };
    if let Some(warning) = failure_note(&report) {
        output.push_str("\n\n");
        output.push_str(&warning);
    }
    Ok(CommandOutcome { output, exit_code })
}

fn failure_note(report: &TurnReport) -> Option<String> {
    if report.task_failures.is_empty() {
        None
    } else {
        Some(format_task_failures(&report.task_failures))
    }
}

/// Interactive loop: one turn per input line until `quit` or end of input.
///
/// Turn failures are reported and the session stays open.
pub async fn run_chat<R: AsyncBufRead + Unpin, W: Write>(
    session: &mut WritingSession,
    mut input: R,
    mut out: W,
    budget: RunBudget,
) -> Result<(), WriterError> {
    writeln!(out, "Write a message to the writing assistant or type 'quit' to exit.")?;
    loop {
        write!(out, "\nYour message (e.g. {}): ", DEFAULT_REQUEST)?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line).await? == 0 {
            break;
        }
        let message = line.trim();
        if message.eq_ignore_ascii_case("quit") {
            break;
        }
        let message = if message.is_empty() {
            DEFAULT_REQUEST
        } else {
            message
        };

        match session.handle(message, budget).await {
            Ok(report) => {
                match &report.outcome {
                    TurnOutcome::Complete(document) => {
                        writeln!(out, "\n{}\n", format_complete(document))?;
                    }
                    TurnOutcome::Pending => {
                        writeln!(out, "{}", format_pending(session.state()))?;
                    }
                }
                if let Some(warning) = failure_note(&report) {
                    writeln!(out, "{}", warning)?;
                }
            }
            Err(e) => {
                error!(error = %e, "Turn failed");
                writeln!(out, "Error: {}", map_error(&e))?;
            }
        }
    }
    writeln!(out, "Goodbye!")?;
    Ok(())
}
