//! CLI parse: clap types for Quill. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Quill CLI - plan, draft, merge and review long-form documents with a language model
#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(about = "Iterative document writing driven by a language model")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (quill.toml is read from here)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Wall-clock budget per turn, in seconds
    #[arg(long)]
    pub budget_secs: Option<u64>,

    /// Backend call budget per turn, retries included
    #[arg(long)]
    pub max_calls: Option<u32>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Interactive session; follow-up messages revise the same document
    Chat,
    /// Write one document and print it
    Write {
        /// What to write
        #[arg(required = true, num_args = 1..)]
        request: Vec<String>,
    },
    /// Print the effective configuration as TOML
    Config,
}
