use super::defaults::{
    DEFAULT_API_KEY_ENV, DEFAULT_GENERATOR_API_PATH, DEFAULT_GENERATOR_ENDPOINT,
    DEFAULT_GENERATOR_MODEL, DEFAULT_GENERATOR_TIMEOUT_SECS, DEFAULT_MAX_TOKENS,
    DEFAULT_SYSTEM_PROMPT, DEFAULT_TEMPERATURE,
};
use super::error::ConfigError;
use serde::Deserialize;
use std::time::Duration;

/// Settings for delegated summarization.
#[derive(Debug, Clone, PartialEq)]
pub struct SummarizerConfig {
    pub endpoint: String,
    pub api_path: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub system_prompt: String,
    pub timeout: Duration,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_GENERATOR_ENDPOINT.to_string(),
            api_path: DEFAULT_GENERATOR_API_PATH.to_string(),
            model: DEFAULT_GENERATOR_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            timeout: Duration::from_secs(DEFAULT_GENERATOR_TIMEOUT_SECS),
        }
    }
}

impl SummarizerConfig {
    pub fn with_api_key_env(mut self, name: impl Into<String>) -> Self {
        self.api_key_env = name.into();
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawSummarizer {
    endpoint: Option<String>,
    api_path: Option<String>,
    model: Option<String>,
    api_key_env: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    system_prompt: Option<String>,
    timeout_secs: Option<u64>,
}

impl TryFrom<RawSummarizer> for SummarizerConfig {
    type Error = ConfigError;

    fn try_from(raw: RawSummarizer) -> Result<Self, Self::Error> {
        let defaults = Self::default();
        let config = Self {
            endpoint: raw.endpoint.unwrap_or(defaults.endpoint),
            api_path: raw.api_path.unwrap_or(defaults.api_path),
            model: raw.model.unwrap_or(defaults.model),
            api_key_env: raw.api_key_env.unwrap_or(defaults.api_key_env),
            max_tokens: raw.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: raw.temperature.unwrap_or(defaults.temperature),
            system_prompt: raw.system_prompt.unwrap_or(defaults.system_prompt),
            timeout: raw
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        };

        if config.max_tokens == 0 {
            return Err(ConfigError::invalid(
                "summarizer.max_tokens",
                "must be greater than zero",
            ));
        }
        if !(0.0..=1.0).contains(&config.temperature) {
            return Err(ConfigError::invalid(
                "summarizer.temperature",
                format!("{} is outside 0.0..=1.0", config.temperature),
            ));
        }
        if config.api_key_env.trim().is_empty() {
            return Err(ConfigError::invalid(
                "summarizer.api_key_env",
                "must name an environment variable",
            ));
        }
        if config.timeout.is_zero() {
            return Err(ConfigError::invalid(
                "summarizer.timeout_secs",
                "must be greater than zero",
            ));
        }
        Ok(config)
    }
}
