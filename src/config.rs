//! Configuration System
//!
//! Layered configuration for provider, writing loop and logging. Sources are
//! merged lowest to highest: built-in defaults, the global file, the
//! workspace `quill.toml`, then `QUILL__SECTION__KEY` environment variables.

use crate::error::WriterError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};

pub use crate::provider::{ProviderConfig, ProviderType};
pub use crate::writer::WriterConfig;

mod loader;
mod merge;
mod sources;

pub use loader::ConfigLoader;
pub use sources::environment::ENV_PREFIX;
pub use sources::global_file::global_config_path;
pub use sources::workspace_file::{workspace_config_path, WORKSPACE_CONFIG_FILE};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuillConfig {
    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub writer: WriterConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Provider(String),
    Writer(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Provider(msg) => write!(f, "Provider: {}", msg),
            ValidationError::Writer(msg) => write!(f, "Writer: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl QuillConfig {
    /// Validate every section, collecting all problems.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.provider.validate() {
            errors.push(ValidationError::Provider(e));
        }
        if let Err(e) = self.writer.validate() {
            errors.push(ValidationError::Writer(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// `validate` folded into a single [`WriterError::ConfigError`].
    pub fn ensure_valid(&self) -> Result<(), WriterError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            WriterError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })
    }

    /// Effective configuration as TOML with any API key masked.
    pub fn to_toml_redacted(&self) -> Result<String, WriterError> {
        let mut shown = self.clone();
        if shown.provider.api_key.is_some() {
            shown.provider.api_key = Some("<redacted>".to_string());
        }
        toml::to_string_pretty(&shown)
            .map_err(|e| WriterError::ConfigError(format!("Failed to render config: {}", e)))
    }
}
