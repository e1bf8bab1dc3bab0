//! Merge rules: built-in defaults sit under every other source.

use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with the built-in defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("provider.provider_type", "openai")?
        .set_default("provider.model", "gpt-4o")?
        .set_default("writer.priority_threshold", 0)?
        .set_default("writer.max_plan_size", 5)?
        .set_default("writer.max_extra_iterations", 2)?
        .set_default("writer.min_word_count", 1500)?
        .set_default("logging.level", "info")
}
