//! Model Provider Abstraction
//!
//! The text-generation backend the writing loop talks to. Every stage of the
//! loop reaches the model through [`Backend::post`]; the HTTP clients here
//! only translate a role-tagged message list into one provider request.

use crate::error::WriterError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

pub mod backend;
pub mod profile;

pub use backend::{Backend, CallMeter, RetryPolicy};
pub use profile::{ProviderConfig, ProviderType};

/// Model provider selection with everything needed to build a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ModelProvider {
    OpenAI {
        model: String,
        api_key: String,
        base_url: Option<String>, // For custom endpoints (e.g., Azure OpenAI)
    },
    Anthropic {
        model: String,
        api_key: String,
    },
    Ollama {
        model: String,
        base_url: Option<String>, // Default: http://localhost:11434
    },
    LocalCustom {
        model: String,
        endpoint: String, // Full endpoint URL (e.g., http://localhost:8080/v1)
        api_key: Option<String>,
    },
}

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// Chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Completion options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,  // 0.0-2.0, default: 1.0
    pub max_tokens: Option<u32>,   // Maximum tokens to generate
    pub top_p: Option<f32>,        // Nucleus sampling
    pub stop: Option<Vec<String>>, // Stop sequences
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: Some(1.0),
            max_tokens: None,
            top_p: None,
            stop: None,
        }
    }
}

/// Token usage information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub usage: TokenUsage,
    pub finish_reason: Option<String>,
}

/// Model provider client trait
#[async_trait]
pub trait ModelProviderClient: Send + Sync {
    /// Generate a single best completion from a list of messages
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, WriterError>;

    /// Get the provider name
    fn provider_name(&self) -> &str;

    /// Get the model name
    fn model_name(&self) -> &str;
}

// OpenAI-compatible API request/response structures
#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    model: String,
    choices: Vec<Choice>,
    usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: WireMessage,
    finish_reason: Option<String>,
}

fn map_http_error(error: reqwest::Error) -> WriterError {
    if let Some(status) = error.status() {
        return map_status(status.as_u16(), &error.to_string());
    }
    if error.is_timeout() {
        WriterError::ProviderRequestFailed(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        WriterError::ProviderRequestFailed(format!("Connection error: {}", error))
    } else {
        WriterError::ProviderError(format!("HTTP error: {}", error))
    }
}

fn map_status(status: u16, detail: &str) -> WriterError {
    match status {
        401 | 403 => WriterError::ProviderAuthFailed(format!("Authentication failed: {}", detail)),
        429 => WriterError::ProviderRateLimit(format!("Rate limit exceeded: {}", detail)),
        404 => WriterError::ProviderModelNotFound(format!("Model not found: {}", detail)),
        _ => WriterError::ProviderRequestFailed(format!(
            "Request failed with status {}: {}",
            status, detail
        )),
    }
}

async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response, WriterError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(map_status(status, &error_text))
}

const PROVIDER_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const PROVIDER_HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

fn build_provider_http_client() -> Result<Client, WriterError> {
    Client::builder()
        .connect_timeout(PROVIDER_HTTP_CONNECT_TIMEOUT)
        .timeout(PROVIDER_HTTP_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| WriterError::ProviderError(format!("Failed to create HTTP client: {}", e)))
}

/// Client for any `/chat/completions` endpoint: OpenAI, Ollama, local servers.
pub struct OpenAICompatibleClient {
    client: Client,
    provider_name: &'static str,
    model: String,
    chat_url: String,
    api_key: Option<String>,
}

impl OpenAICompatibleClient {
    pub fn new(
        provider_name: &'static str,
        model: String,
        base_url: &str,
        api_key: Option<String>,
    ) -> Result<Self, WriterError> {
        Ok(Self {
            client: build_provider_http_client()?,
            provider_name,
            model,
            chat_url: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
        })
    }
}

#[async_trait]
impl ModelProviderClient for OpenAICompatibleClient {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, WriterError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: messages
                .into_iter()
                .map(|msg| WireMessage {
                    role: msg.role.as_str().to_string(),
                    content: msg.content,
                })
                .collect(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            top_p: options.top_p,
            stop: options.stop,
            stream: false,
        };

        let mut builder = self.client.post(&self.chat_url).json(&request);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }
        let response = builder.send().await.map_err(map_http_error)?;
        let response = error_for_status(response).await?;

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| WriterError::ProviderError(format!("Failed to parse response: {}", e)))?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| WriterError::ProviderError("No choices in response".to_string()))?;

        Ok(CompletionResponse {
            content: choice.message.content,
            model: completion.model,
            usage: completion.usage.unwrap_or_default(),
            finish_reason: choice.finish_reason,
        })
    }

    fn provider_name(&self) -> &str {
        self.provider_name
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Anthropic messages API client.
pub struct AnthropicClient {
    client: Client,
    model: String,
    api_key: String,
}

impl AnthropicClient {
    const MESSAGES_URL: &'static str = "https://api.anthropic.com/v1/messages";
    const DEFAULT_MAX_TOKENS: u32 = 4096;

    pub fn new(model: String, api_key: String) -> Result<Self, WriterError> {
        Ok(Self {
            client: build_provider_http_client()?,
            model,
            api_key,
        })
    }
}

#[async_trait]
impl ModelProviderClient for AnthropicClient {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, WriterError> {
        // System prompts are a top-level field; every other turn keeps its role.
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| m.content.as_str())
            .collect();
        let turns: Vec<_> = messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(|m| json!({"role": m.role.as_str(), "content": m.content}))
            .collect();

        let mut request_body = json!({
            "model": self.model,
            "max_tokens": options.max_tokens.unwrap_or(Self::DEFAULT_MAX_TOKENS),
            "messages": turns,
        });
        if !system.is_empty() {
            request_body["system"] = json!(system.join("\n\n"));
        }
        if let Some(temp) = options.temperature {
            request_body["temperature"] = json!(temp);
        }
        if let Some(stop) = options.stop {
            request_body["stop_sequences"] = json!(stop);
        }

        let response = self
            .client
            .post(Self::MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request_body)
            .send()
            .await
            .map_err(map_http_error)?;
        let response = error_for_status(response).await?;

        #[derive(Deserialize)]
        struct AnthropicResponse {
            content: Vec<AnthropicContent>,
            model: String,
            usage: Option<AnthropicUsage>,
            stop_reason: Option<String>,
        }

        #[derive(Deserialize)]
        struct AnthropicContent {
            #[serde(default)]
            text: String,
        }

        #[derive(Deserialize)]
        struct AnthropicUsage {
            input_tokens: u32,
            output_tokens: u32,
        }

        let completion: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| WriterError::ProviderError(format!("Failed to parse response: {}", e)))?;

        let content = completion
            .content
            .into_iter()
            .map(|c| c.text)
            .collect::<Vec<_>>()
            .join("");
        let usage = completion
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.input_tokens,
                completion_tokens: u.output_tokens,
                total_tokens: u.input_tokens + u.output_tokens,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            content,
            model: completion.model,
            usage,
            finish_reason: completion.stop_reason,
        })
    }

    fn provider_name(&self) -> &str {
        "anthropic"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Provider factory for creating provider clients
pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create_client(
        provider: &ModelProvider,
    ) -> Result<Box<dyn ModelProviderClient>, WriterError> {
        match provider {
            ModelProvider::OpenAI {
                model,
                api_key,
                base_url,
            } => Ok(Box::new(OpenAICompatibleClient::new(
                "openai",
                model.clone(),
                base_url.as_deref().unwrap_or("https://api.openai.com/v1"),
                Some(api_key.clone()),
            )?)),
            ModelProvider::Anthropic { model, api_key } => Ok(Box::new(AnthropicClient::new(
                model.clone(),
                api_key.clone(),
            )?)),
            ModelProvider::Ollama { model, base_url } => {
                let base = base_url.as_deref().unwrap_or("http://localhost:11434");
                Ok(Box::new(OpenAICompatibleClient::new(
                    "ollama",
                    model.clone(),
                    &format!("{}/v1", base.trim_end_matches('/')),
                    None,
                )?))
            }
            ModelProvider::LocalCustom {
                model,
                endpoint,
                api_key,
            } => Ok(Box::new(OpenAICompatibleClient::new(
                "local",
                model.clone(),
                endpoint,
                api_key.clone(),
            )?)),
        }
    }
}

/// Scripted provider for unit tests.
///
/// Replies are chosen by the first rule whose needle appears in the request's
/// last message; otherwise the next queued reply is used; otherwise
/// `"Mock response"`. Every request is recorded.
#[cfg(test)]
pub struct MockProvider {
    rules: Vec<(String, Result<String, fn(String) -> WriterError>)>,
    queue: parking_lot::Mutex<std::collections::VecDeque<Result<String, WriterError>>>,
    pub requests: parking_lot::Mutex<Vec<Vec<ChatMessage>>>,
}

#[cfg(test)]
impl MockProvider {
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            rules: Vec::new(),
            queue: parking_lot::Mutex::new(responses.into_iter().map(|r| Ok(r.to_string())).collect()),
            requests: parking_lot::Mutex::new(Vec::new()),
        }
    }

    pub fn with_failures(responses: Vec<Result<String, WriterError>>) -> Self {
        Self {
            rules: Vec::new(),
            queue: parking_lot::Mutex::new(responses.into_iter().collect()),
            requests: parking_lot::Mutex::new(Vec::new()),
        }
    }

    pub fn when(mut self, needle: &str, reply: &str) -> Self {
        self.rules.push((needle.to_string(), Ok(reply.to_string())));
        self
    }

    pub fn fail_when(mut self, needle: &str, error: fn(String) -> WriterError) -> Self {
        self.rules.push((needle.to_string(), Err(error)));
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[cfg(test)]
#[async_trait]
impl ModelProviderClient for MockProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        _options: CompletionOptions,
    ) -> Result<CompletionResponse, WriterError> {
        let prompt = messages.last().map(|m| m.content.clone()).unwrap_or_default();
        self.requests.lock().push(messages);

        let matched = self
            .rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, reply)| match reply {
                Ok(text) => Ok(text.clone()),
                Err(make) => Err(make("scripted failure".to_string())),
            });
        let reply = match matched {
            Some(reply) => reply,
            None => self
                .queue
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok("Mock response".to_string())),
        };

        reply.map(|content| CompletionResponse {
            content,
            model: "mock-model".to_string(),
            usage: TokenUsage::default(),
            finish_reason: Some("stop".to_string()),
        })
    }

    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}
