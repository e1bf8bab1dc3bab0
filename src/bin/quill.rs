//! Quill CLI Binary
//!
//! Command-line interface for the Quill writing loop.

use anyhow::Context;
use clap::Parser;
use quill::cli::{Cli, RunContext};
use quill::config::ConfigLoader;
use quill::error::WriterError;
use quill::logging::{init_logging, LoggingConfig};
use std::process;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let logging_config = build_logging_config(&cli);
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("Quill CLI starting");

    match run(&cli).await {
        Ok(0) => {}
        Ok(code) => process::exit(code),
        Err(e) => {
            error!("Command failed: {:#}", e);
            match e.downcast_ref::<WriterError>() {
                Some(writer_error) => eprintln!("{}", quill::cli::map_error(writer_error)),
                None => eprintln!("{:#}", e),
            }
            process::exit(1);
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<i32> {
    let context = RunContext::new(cli.workspace.clone(), cli.config.clone())
        .context("Error loading configuration")?
        .with_budget_overrides(cli.budget_secs, cli.max_calls);

    let outcome = context.execute(&cli.command).await?;
    if !outcome.output.is_empty() {
        println!("{}", outcome.output);
    }
    info!(exit_code = outcome.exit_code, "Command finished");
    Ok(outcome.exit_code)
}

/// Build logging configuration from CLI args and the config file.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    let mut config = match cli.config {
        Some(ref config_path) => ConfigLoader::load_from_file(config_path)
            .ok()
            .map(|c| c.logging)
            .unwrap_or_default(),
        None => ConfigLoader::load(&cli.workspace)
            .ok()
            .map(|c| c.logging)
            .unwrap_or_default(),
    };

    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        config.file = file.clone();
        if cli.log_output.is_none() {
            config.output = "file".to_string();
        }
    }

    config
}
