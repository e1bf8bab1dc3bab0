//! Provider configuration as it appears in `quill.toml`.

use crate::error::WriterError;
use crate::provider::{CompletionOptions, ModelProvider};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    #[serde(alias = "open_ai")]
    OpenAI,
    Anthropic,
    Ollama,
    #[serde(alias = "local_custom")]
    Local,
}

impl ProviderType {
    fn api_key_env(self) -> Option<&'static str> {
        match self {
            ProviderType::OpenAI => Some("OPENAI_API_KEY"),
            ProviderType::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderType::Ollama | ProviderType::Local => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub provider_type: ProviderType,

    pub model: String,

    /// Falls back to the provider's conventional environment variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub default_options: CompletionOptions,

    /// Retries after a rate-limit or transport failure.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: ProviderType::OpenAI,
            model: "gpt-4o".to_string(),
            api_key: None,
            endpoint: None,
            default_options: CompletionOptions::default(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("Model cannot be empty".to_string());
        }
        if self.provider_type == ProviderType::Local && self.endpoint.is_none() {
            return Err("Local providers require an endpoint".to_string());
        }
        if let Some(temp) = self.default_options.temperature {
            if !(0.0..=2.0).contains(&temp) {
                return Err(format!("Temperature must be within 0.0..=2.0, got {}", temp));
            }
        }
        Ok(())
    }

    fn resolve_api_key(&self) -> Option<String> {
        self.api_key.clone().or_else(|| {
            self.provider_type
                .api_key_env()
                .and_then(|var| std::env::var(var).ok())
        })
    }

    /// Build the concrete provider selection, resolving the API key.
    pub fn to_model_provider(&self) -> Result<ModelProvider, WriterError> {
        let model = self.model.clone();
        let required_key = || {
            self.resolve_api_key().ok_or_else(|| {
                WriterError::ProviderNotConfigured(format!(
                    "No API key for {:?}: set provider.api_key or {}",
                    self.provider_type,
                    self.provider_type.api_key_env().unwrap_or("an api key")
                ))
            })
        };
        Ok(match self.provider_type {
            ProviderType::OpenAI => ModelProvider::OpenAI {
                model,
                api_key: required_key()?,
                base_url: self.endpoint.clone(),
            },
            ProviderType::Anthropic => ModelProvider::Anthropic {
                model,
                api_key: required_key()?,
            },
            ProviderType::Ollama => ModelProvider::Ollama {
                model,
                base_url: self.endpoint.clone(),
            },
            ProviderType::Local => ModelProvider::LocalCustom {
                model,
                endpoint: self.endpoint.clone().ok_or_else(|| {
                    WriterError::ProviderNotConfigured(
                        "Local providers require an endpoint".to_string(),
                    )
                })?,
                api_key: self.resolve_api_key(),
            },
        })
    }
}
