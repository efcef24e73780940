// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::*;
use crate::config::validation::validate_config;
use crate::engine::{BatchFailurePolicy, BatchMode, RetryDelay, RetryPolicy};
use crate::errors::ConfigError;
use crate::observability::messages::validation::ConfigValidationFailed;
use crate::observability::messages::StructuredLog;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration.
///
/// Every section and field is optional; anything missing takes its default.
/// Secrets are never read from this file, only from the environment.
///
/// # Example
/// ```yaml
/// model:
///   name: gemini-2.5-flash
///   temperature: 0.7
///   max_tokens: 2048
///   timeout_secs: 60
/// search:
///   max_results: 3
///   depth: basic
/// retry:
///   max_retries: 2
///   delay_ms: 500
///   backoff: exponential
///   max_delay_ms: 5000
/// batch:
///   concurrent: true
///   max_concurrency: 4
///   failure_policy: keep_partial
/// session:
///   conversation_dir: Conversations
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub model: ModelConfig,
    pub search: SearchConfig,
    pub retry: RetryConfig,
    pub batch: BatchConfig,
    pub session: SessionConfig,
}

/// Completion model parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub name: String,
    pub temperature: f32,
    /// Omitted from requests when unset.
    pub max_tokens: Option<u32>,
    pub timeout_secs: u64,
    /// Used instead of `timeout_secs` when images are attached.
    pub image_timeout_secs: u64,
    pub api_base: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
            timeout_secs: DEFAULT_MODEL_TIMEOUT_SECS,
            image_timeout_secs: DEFAULT_IMAGE_TIMEOUT_SECS,
            api_base: DEFAULT_MODEL_API_BASE.to_string(),
        }
    }
}

impl ModelConfig {
    pub fn timeout(&self, with_images: bool) -> Duration {
        if with_images {
            Duration::from_secs(self.image_timeout_secs)
        } else {
            Duration::from_secs(self.timeout_secs)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchDepth {
    #[default]
    Basic,
    Advanced,
}

impl SearchDepth {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchDepth::Basic => "basic",
            SearchDepth::Advanced => "advanced",
        }
    }
}

/// Web search parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_results: usize,
    pub depth: SearchDepth,
    pub timeout_secs: u64,
    pub api_url: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_SEARCH_MAX_RESULTS,
            depth: SearchDepth::default(),
            timeout_secs: DEFAULT_SEARCH_TIMEOUT_SECS,
            api_url: DEFAULT_SEARCH_API_URL.to_string(),
        }
    }
}

impl SearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backoff {
    Constant,
    #[default]
    Exponential,
}

/// Retry policy for nodes that call external services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub delay_ms: u64,
    pub backoff: Backoff,
    /// Cap for exponential backoff.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_RETRY_MAX_RETRIES,
            delay_ms: DEFAULT_RETRY_DELAY_MS,
            backoff: Backoff::default(),
            max_delay_ms: DEFAULT_RETRY_MAX_DELAY_MS,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        let initial = Duration::from_millis(self.delay_ms);
        let delay = if initial.is_zero() {
            RetryDelay::None
        } else {
            match self.backoff {
                Backoff::Constant => RetryDelay::Constant(initial),
                Backoff::Exponential => RetryDelay::Exponential {
                    initial,
                    max: Duration::from_millis(self.max_delay_ms.max(self.delay_ms)),
                    factor: 2,
                },
            }
        };
        RetryPolicy::new(self.max_retries).with_delay(delay)
    }
}

/// Batch scheduling for the batch flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub concurrent: bool,
    /// Unbounded when unset.
    pub max_concurrency: Option<usize>,
    pub failure_policy: BatchFailurePolicy,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrent: true,
            max_concurrency: None,
            failure_policy: BatchFailurePolicy::default(),
        }
    }
}

impl BatchConfig {
    pub fn mode(&self) -> BatchMode {
        if self.concurrent {
            BatchMode::Concurrent {
                max_concurrency: self.max_concurrency,
            }
        } else {
            BatchMode::Sequential
        }
    }
}

/// Interactive session settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Where conversation histories are saved.
    pub conversation_dir: PathBuf,
    /// Context used by the answer node when the store holds none.
    pub system_context: String,
    /// Markdown renderer; answers print as plain text when it cannot be run.
    pub renderer: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            conversation_dir: PathBuf::from(DEFAULT_CONVERSATION_DIR),
            system_context: DEFAULT_SYSTEM_CONTEXT.to_string(),
            renderer: DEFAULT_RENDERER.to_string(),
        }
    }
}

/// Load a config from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_config(&content)
}

/// Parse a config from YAML text. An empty document yields the defaults.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    if content.trim().is_empty() {
        return Ok(AppConfig::default());
    }
    Ok(serde_yaml::from_str(content)?)
}

/// Load and validate a config from a YAML file
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    let cfg = load_config(path)?;

    if let Err(problems) = validate_config(&cfg) {
        ConfigValidationFailed {
            path: &path.display().to_string(),
            problems: &problems,
        }
        .log();
        return Err(ConfigError::Invalid(problems));
    }

    Ok(cfg)
}

/// Resolve the configuration the binary runs with: the explicit path when
/// given, else [`DEFAULT_CONFIG_PATH`] if it exists, else the defaults.
pub fn resolve_config(explicit: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match explicit {
        Some(path) => load_and_validate_config(path),
        None if Path::new(DEFAULT_CONFIG_PATH).is_file() => {
            load_and_validate_config(DEFAULT_CONFIG_PATH)
        }
        None => Ok(AppConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(yaml: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
model:
  name: gemini-2.5-pro
  temperature: 0.2
  max_tokens: 1024
search:
  max_results: 5
  depth: advanced
retry:
  max_retries: 4
  delay_ms: 100
  backoff: constant
batch:
  concurrent: false
  failure_policy: keep_partial
session:
  conversation_dir: /tmp/history
"#;

        let cfg = parse_config(yaml).unwrap();
        assert_eq!(cfg.model.name, "gemini-2.5-pro");
        assert_eq!(cfg.model.max_tokens, Some(1024));
        assert_eq!(cfg.model.timeout_secs, DEFAULT_MODEL_TIMEOUT_SECS);
        assert_eq!(cfg.search.depth, SearchDepth::Advanced);
        assert_eq!(cfg.batch.mode(), BatchMode::Sequential);
        assert_eq!(cfg.batch.failure_policy, BatchFailurePolicy::KeepPartial);
        assert_eq!(cfg.session.conversation_dir, PathBuf::from("/tmp/history"));
        assert_eq!(
            cfg.retry.to_policy(),
            RetryPolicy::constant(4, Duration::from_millis(100))
        );
    }

    #[test]
    fn test_missing_sections_take_defaults() {
        let cfg = parse_config("model:\n  temperature: 1.1\n").unwrap();
        assert_eq!(cfg.model.name, DEFAULT_MODEL);
        assert_eq!(cfg.model.temperature, 1.1);
        assert_eq!(cfg.search, SearchConfig::default());
        assert_eq!(cfg.session, SessionConfig::default());

        assert_eq!(parse_config("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_model_timeout_depends_on_images() {
        let model = ModelConfig::default();
        assert_eq!(model.timeout(false), Duration::from_secs(60));
        assert_eq!(model.timeout(true), Duration::from_secs(90));
    }

    #[test]
    fn test_default_retry_policy_is_exponential() {
        let policy = RetryConfig::default().to_policy();
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.delay_for(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(10), Duration::from_millis(5000));

        let immediate = RetryConfig {
            delay_ms: 0,
            ..RetryConfig::default()
        };
        assert_eq!(immediate.to_policy().delay, RetryDelay::None);
    }

    #[test]
    fn test_load_and_validate_valid_config() {
        let file = write_temp("batch:\n  max_concurrency: 2\n");
        let cfg = load_and_validate_config(file.path()).unwrap();
        assert_eq!(
            cfg.batch.mode(),
            BatchMode::Concurrent {
                max_concurrency: Some(2)
            }
        );
    }

    #[test]
    fn test_load_and_validate_rejects_out_of_range_values() {
        let file = write_temp("model:\n  temperature: 3.5\n  timeout_secs: 0\n");
        let err = load_and_validate_config(file.path()).unwrap_err();
        match err {
            ConfigError::Invalid(problems) => assert_eq!(problems.len(), 2),
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_enum_value_is_a_parse_error() {
        let err = parse_config("search:\n  depth: deep\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here.yaml"));
    }
}
