//! Shared test utilities for integration tests
//!
//! A scripted text-generation client plus isolated XDG environment setup.

use async_trait::async_trait;
use parking_lot::Mutex as PlMutex;
use quill::error::WriterError;
use quill::provider::{
    Backend, ChatMessage, CompletionOptions, CompletionResponse, ModelProviderClient,
    RetryPolicy, TokenUsage,
};
use quill::writer::{WriterConfig, WritingSession};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Scripted client: rules match on the last message, otherwise replies are
/// taken from a queue in order. Every request is recorded.
#[derive(Default)]
pub struct ScriptedProvider {
    rules: Vec<(String, String)>,
    queue: PlMutex<VecDeque<Result<String, WriterError>>>,
    delay: Option<Duration>,
    pub requests: PlMutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replies(replies: &[&str]) -> Self {
        let provider = Self::new();
        provider
            .queue
            .lock()
            .extend(replies.iter().map(|r| Ok(r.to_string())));
        provider
    }

    pub fn when(mut self, needle: &str, reply: &str) -> Self {
        self.rules.push((needle.to_string(), reply.to_string()));
        self
    }

    pub fn then_fail(self, error: WriterError) -> Self {
        self.queue.lock().push_back(Err(error));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// System prompt of every recorded request, in call order.
    pub fn system_prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(|messages| messages[0].content.clone())
            .collect()
    }

    pub fn user_prompt(&self, index: usize) -> String {
        self.requests.lock()[index][1].content.clone()
    }
}

#[async_trait]
impl ModelProviderClient for ScriptedProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        _options: CompletionOptions,
    ) -> Result<CompletionResponse, WriterError> {
        let prompt = messages.last().map(|m| m.content.clone()).unwrap_or_default();
        self.requests.lock().push(messages);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = match self.rules.iter().find(|(needle, _)| prompt.contains(needle.as_str())) {
            Some((_, reply)) => Ok(reply.clone()),
            None => self
                .queue
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok(String::new())),
        };
        reply.map(|content| CompletionResponse {
            content,
            model: "scripted".to_string(),
            usage: TokenUsage::default(),
            finish_reason: Some("stop".to_string()),
        })
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

pub fn session_with(provider: Arc<ScriptedProvider>, config: WriterConfig) -> WritingSession {
    let backend = Backend::new(provider).with_retry(RetryPolicy::none());
    WritingSession::new(backend, config)
}

/// One task at a time so queued replies line up with plan order.
pub fn sequential_config() -> WriterConfig {
    WriterConfig {
        max_concurrent_tasks: 1,
        ..WriterConfig::default()
    }
}

/// Global mutex to serialize environment variable access across all tests
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Environment variable state to restore after test
struct EnvState {
    home: Option<String>,
    xdg_config_home: Option<String>,
}

impl EnvState {
    fn capture() -> Self {
        Self {
            home: std::env::var("HOME").ok(),
            xdg_config_home: std::env::var("XDG_CONFIG_HOME").ok(),
        }
    }

    fn restore(self) {
        match self.home {
            Some(orig) => std::env::set_var("HOME", orig),
            None => std::env::remove_var("HOME"),
        }
        match self.xdg_config_home {
            Some(orig) => std::env::set_var("XDG_CONFIG_HOME", orig),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }
    }
}

/// Run `f` with XDG_CONFIG_HOME pointed at `test_dir` and HOME at
/// `test_dir/home`, restoring both afterwards.
pub fn with_xdg_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let env_state = EnvState::capture();

    let test_home = test_dir.path().join("home");
    std::fs::create_dir_all(&test_home).unwrap();
    std::env::set_var("HOME", &test_home);
    std::env::set_var("XDG_CONFIG_HOME", test_dir.path());

    let result = f();

    env_state.restore();
    result
}

/// Run `f` holding the environment lock, with extra variables set for its duration.
pub fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    for (key, value) in vars {
        std::env::set_var(key, value);
    }
    let result = f();
    for (key, _) in vars {
        std::env::remove_var(key);
    }
    result
}
