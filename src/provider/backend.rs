//! Backend: the one door every loop stage uses to reach the model.
//!
//! Wraps a provider client with default completion options, bounded retry on
//! retryable failures, and a shared call meter that enforces the per-turn
//! call budget.

use crate::error::WriterError;
use crate::provider::{
    ChatMessage, CompletionOptions, ModelProviderClient, ProviderConfig, ProviderFactory,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            retry_delay: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Default)]
struct MeterState {
    used: u32,
    limit: Option<u32>,
}

/// Counts backend calls against an optional limit.
#[derive(Debug, Clone, Default)]
pub struct CallMeter {
    inner: Arc<Mutex<MeterState>>,
}

impl CallMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh count with a new limit.
    pub fn reset(&self, limit: Option<u32>) {
        let mut state = self.inner.lock();
        state.used = 0;
        state.limit = limit;
    }

    /// Reserve one call, failing once the limit is reached.
    pub fn acquire(&self) -> Result<u32, WriterError> {
        let mut state = self.inner.lock();
        if let Some(limit) = state.limit {
            if state.used >= limit {
                return Err(WriterError::BudgetExhausted(format!(
                    "call budget of {} backend calls used up",
                    limit
                )));
            }
        }
        state.used += 1;
        Ok(state.used)
    }

    pub fn used(&self) -> u32 {
        self.inner.lock().used
    }
}

/// Text-generation backend: ordered role-tagged messages in, one completion out.
#[derive(Clone)]
pub struct Backend {
    client: Arc<dyn ModelProviderClient>,
    options: CompletionOptions,
    retry: RetryPolicy,
    meter: CallMeter,
}

impl Backend {
    pub fn new(client: Arc<dyn ModelProviderClient>) -> Self {
        Self {
            client,
            options: CompletionOptions::default(),
            retry: RetryPolicy::default(),
            meter: CallMeter::new(),
        }
    }

    /// Build the configured provider client with its options and retry policy.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, WriterError> {
        let client = ProviderFactory::create_client(&config.to_model_provider()?)?;
        info!(
            provider = client.provider_name(),
            model = client.model_name(),
            max_retries = config.max_retries,
            "Backend ready"
        );
        Ok(Self::new(Arc::from(client))
            .with_options(config.default_options.clone())
            .with_retry(RetryPolicy {
                max_retries: config.max_retries,
                retry_delay: Duration::from_millis(config.retry_delay_ms),
            }))
    }

    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn meter(&self) -> &CallMeter {
        &self.meter
    }

    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }

    pub fn provider_name(&self) -> &str {
        self.client.provider_name()
    }

    /// Issue one logical generation call. `purpose` labels the call in logs.
    pub async fn post(
        &self,
        purpose: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<String, WriterError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let call_number = self.meter.acquire()?;
            let start = Instant::now();
            debug!(
                purpose,
                attempt,
                call_number,
                message_count = messages.len(),
                provider = self.client.provider_name(),
                "Provider request sent"
            );

            match self
                .client
                .complete(messages.clone(), self.options.clone())
                .await
            {
                Ok(response) => {
                    info!(
                        purpose,
                        attempt,
                        duration_ms = start.elapsed().as_millis() as u64,
                        response_chars = response.content.chars().count(),
                        "Provider response received"
                    );
                    return Ok(response.content);
                }
                Err(err) if err.is_retryable() && attempt <= self.retry.max_retries => {
                    warn!(
                        purpose,
                        attempt,
                        error = %err,
                        delay_ms = self.retry.retry_delay.as_millis() as u64,
                        "Provider request failed, retrying"
                    );
                    tokio::time::sleep(self.retry.retry_delay).await;
                }
                Err(err) => {
                    warn!(purpose, attempt, error = %err, "Provider request failed");
                    return Err(err);
                }
            }
        }
    }
}
