//! Integration tests for provider construction and the backend contract

use crate::integration::test_utils::ScriptedProvider;
use quill::config::{ProviderConfig, ProviderType};
use quill::error::WriterError;
use quill::provider::{Backend, ChatMessage, ModelProvider, ProviderFactory, RetryPolicy};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_factory_builds_each_provider_kind() {
    let cases = vec![
        (
            ModelProvider::OpenAI {
                model: "gpt-4o".to_string(),
                api_key: "test-key".to_string(),
                base_url: None,
            },
            "openai",
        ),
        (
            ModelProvider::Anthropic {
                model: "claude-3-5-sonnet".to_string(),
                api_key: "test-key".to_string(),
            },
            "anthropic",
        ),
        (
            ModelProvider::Ollama {
                model: "llama3".to_string(),
                base_url: None,
            },
            "ollama",
        ),
        (
            ModelProvider::LocalCustom {
                model: "custom-model".to_string(),
                endpoint: "http://localhost:8080/v1".to_string(),
                api_key: None,
            },
            "local",
        ),
    ];

    for (provider, expected_name) in cases {
        let client = ProviderFactory::create_client(&provider).unwrap();
        assert_eq!(client.provider_name(), expected_name);
    }
}

#[test]
fn test_local_provider_requires_endpoint() {
    let config = ProviderConfig {
        provider_type: ProviderType::Local,
        model: "custom".to_string(),
        endpoint: None,
        ..ProviderConfig::default()
    };
    assert!(config.validate().is_err());
    assert!(matches!(
        Backend::from_config(&config),
        Err(WriterError::ProviderNotConfigured(_))
    ));
}

#[test]
fn test_provider_serialization() {
    let provider = ModelProvider::Ollama {
        model: "llama3".to_string(),
        base_url: Some("http://localhost:11434".to_string()),
    };
    let json = serde_json::to_string(&provider).unwrap();
    let back: ModelProvider = serde_json::from_str(&json).unwrap();
    match back {
        ModelProvider::Ollama { model, base_url } => {
            assert_eq!(model, "llama3");
            assert_eq!(base_url.as_deref(), Some("http://localhost:11434"));
        }
        other => panic!("unexpected provider {other:?}"),
    }
}

#[tokio::test]
async fn test_backend_retries_rate_limit_and_counts_every_attempt() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .then_fail(WriterError::ProviderRateLimit("429".into()))
            .then_fail(WriterError::ProviderRateLimit("429".into())),
    );
    let backend = Backend::new(provider.clone()).with_retry(RetryPolicy {
        max_retries: 2,
        retry_delay: Duration::from_millis(1),
    });

    let text = backend
        .post("test", vec![ChatMessage::user("hello")])
        .await
        .unwrap();
    assert_eq!(text, "");
    assert_eq!(provider.request_count(), 3);
    assert_eq!(backend.meter().used(), 3);
}

#[tokio::test]
async fn test_retries_spend_the_call_budget() {
    let provider = Arc::new(
        ScriptedProvider::new().then_fail(WriterError::ProviderRateLimit("429".into())),
    );
    let backend = Backend::new(provider.clone()).with_retry(RetryPolicy {
        max_retries: 3,
        retry_delay: Duration::from_millis(1),
    });
    backend.meter().reset(Some(1));

    let err = backend
        .post("test", vec![ChatMessage::user("hello")])
        .await
        .unwrap_err();
    assert!(err.is_budget_exhausted());
    assert_eq!(provider.request_count(), 1);
}
