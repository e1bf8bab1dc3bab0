//! Integration tests for Configuration System

use crate::integration::test_utils::{with_env_vars, with_xdg_env};
use quill::cli::RunContext;
use quill::config::{ConfigLoader, ProviderType, QuillConfig, ValidationError};
use quill::writer::{RunBudget, TaskFailurePolicy};
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_demo_configuration_file_loads_and_validates() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("demo.toml");

    std::fs::write(
        &config_file,
        r#"
[provider]
provider_type = "openai"
model = "gpt-4o"
api_key = "sk-test"
max_retries = 2

[provider.default_options]
temperature = 1.0

[writer]
max_plan_size = 3
max_extra_iterations = 2
min_word_count = 1500
budget_secs = 300

[logging]
level = "debug"
format = "json"
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&config_file).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.provider.max_retries, 2);
    assert_eq!(config.writer.max_plan_size, 3);
    assert_eq!(config.logging.format, "json");

    let budget = RunBudget::from_config(&config.writer);
    assert_eq!(budget.time, Some(Duration::from_secs(300)));
    assert_eq!(budget.max_calls, None);
}

#[test]
fn test_missing_explicit_config_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    assert!(ConfigLoader::load_from_file(&temp_dir.path().join("absent.toml")).is_err());
}

#[test]
fn test_invalid_values_are_all_reported() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("bad.toml");
    std::fs::write(
        &config_file,
        r#"
[provider]
provider_type = "local"
model = "custom"

[writer]
max_concurrent_tasks = 0
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&config_file).unwrap();
    let errors = config.validate().unwrap_err();
    assert_eq!(errors.len(), 2);
    assert!(errors
        .iter()
        .any(|e| matches!(e, ValidationError::Provider(msg) if msg.contains("endpoint"))));
    assert!(errors.iter().any(|e| matches!(e, ValidationError::Writer(_))));
}

#[test]
fn test_layered_load_precedence() {
    let test_dir = TempDir::new().unwrap();
    let workspace = test_dir.path().join("workspace");
    std::fs::create_dir_all(&workspace).unwrap();
    std::fs::create_dir_all(test_dir.path().join("quill")).unwrap();

    std::fs::write(
        test_dir.path().join("quill").join("config.toml"),
        r#"
[provider]
provider_type = "anthropic"
model = "global-model"

[writer]
min_word_count = 800
judge_retries = 2
"#,
    )
    .unwrap();
    std::fs::write(
        workspace.join("quill.toml"),
        r#"
[writer]
min_word_count = 1200
task_failure_policy = "isolate"
"#,
    )
    .unwrap();

    let config = with_xdg_env(&test_dir, || {
        with_env_vars_unlocked(&[("QUILL__WRITER__JUDGE_RETRIES", "0")], || {
            ConfigLoader::load(&workspace).unwrap()
        })
    });

    assert_eq!(config.provider.provider_type, ProviderType::Anthropic);
    assert_eq!(config.provider.model, "global-model");
    assert_eq!(config.writer.min_word_count, 1200);
    assert_eq!(config.writer.task_failure_policy, TaskFailurePolicy::Isolate);
    assert_eq!(config.writer.judge_retries, 0);
}

// `with_xdg_env` already holds the environment lock.
fn with_env_vars_unlocked<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    for (key, value) in vars {
        std::env::set_var(key, value);
    }
    let result = f();
    for (key, _) in vars {
        std::env::remove_var(key);
    }
    result
}

#[test]
fn test_environment_overrides_provider_model() {
    let test_dir = TempDir::new().unwrap();
    let config = with_env_vars(&[("QUILL__PROVIDER__MODEL", "env-model")], || {
        ConfigLoader::load_layers(None, test_dir.path()).unwrap()
    });
    assert_eq!(config.provider.model, "env-model");
}

#[tokio::test]
async fn test_config_command_prints_effective_toml() {
    let mut config = QuillConfig::default();
    config.provider.api_key = Some("sk-live-secret".to_string());
    config.writer.max_plan_size = 3;
    let context = RunContext::from_config(".".into(), config);

    let outcome = context
        .execute(&quill::cli::Commands::Config)
        .await
        .unwrap();
    assert!(!outcome.output.contains("sk-live-secret"));

    let reparsed: QuillConfig = toml::from_str(&outcome.output).unwrap();
    assert_eq!(reparsed.writer.max_plan_size, 3);
    assert_eq!(reparsed.provider.model, "gpt-4o");
}
