//! Configuration management for chatrelay
//!
//! Parses TOML configuration files and provides typed access to settings.
//! Every section is optional; missing sections and fields fall back to the
//! defaults the relay ships with.

use crate::client::retry::RetryPolicy;
use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Upper bound for any configured timeout, in seconds
pub const MAX_TIMEOUT_SECONDS: u64 = 300;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub completion: CompletionDefaults,
    #[serde(default)]
    pub documents: DocumentsConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3001
}

/// Upstream API configuration
///
/// The credential itself never appears in the file. `api_key_env` names the
/// environment variable it is read from at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_chat_timeout")]
    pub chat_timeout_seconds: u64,
    #[serde(default = "default_image_timeout")]
    pub image_timeout_seconds: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            chat_timeout_seconds: default_chat_timeout(),
            image_timeout_seconds: default_image_timeout(),
        }
    }
}

impl UpstreamConfig {
    /// Timeout applied to each chat completion attempt
    pub fn chat_timeout(&self) -> Duration {
        Duration::from_secs(self.chat_timeout_seconds)
    }

    /// Timeout applied to an image generation call
    pub fn image_timeout(&self) -> Duration {
        Duration::from_secs(self.image_timeout_seconds)
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_chat_timeout() -> u64 {
    30
}

fn default_image_timeout() -> u64 {
    60
}

/// Retry behavior for rate-limited completion calls
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_backoff_ms: default_base_backoff_ms(),
        }
    }
}

impl RetryConfig {
    /// Build the validated retry policy
    pub fn policy(&self) -> AppResult<RetryPolicy> {
        RetryPolicy::new(self.max_attempts, self.base_backoff_ms)
            .map_err(|e| AppError::Config(format!("retry: {}", e)))
    }
}

fn default_max_attempts() -> usize {
    3
}

fn default_base_backoff_ms() -> u64 {
    2_000
}

/// Sampling defaults for completion calls
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompletionDefaults {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Number of prior transcript messages sent along with a new one
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for CompletionDefaults {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            history_limit: default_history_limit(),
        }
    }
}

fn default_model() -> String {
    crate::router::DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_history_limit() -> usize {
    10
}

/// Upload limits for the document store
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DocumentsConfig {
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

fn default_max_file_bytes() -> u64 {
    10 * 1024 * 1024
}

/// Initial session values
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    #[serde(default = "default_display_name")]
    pub display_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            display_name: default_display_name(),
        }
    }
}

fn default_display_name() -> String {
    "User".to_string()
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        // Phase 1: Read file (preserves io::Error context)
        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| {
            AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            }
        })?;

        // Phase 2: Parse TOML (preserves toml::de::Error context)
        let config: Self =
            toml::from_str(&content).map_err(|source| AppError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            })?;

        // Phase 3: Validate parsed config (provides contextual reason)
        config
            .validate()
            .map_err(|e| AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Validate configuration after parsing
    ///
    /// This is called automatically by `from_file()` and `from_str()`, but can
    /// also be called explicitly when constructing Config by hand.
    pub fn validate(&self) -> AppResult<()> {
        let upstream = &self.upstream;
        if !upstream.base_url.starts_with("http://") && !upstream.base_url.starts_with("https://")
        {
            return Err(AppError::Config(format!(
                "upstream.base_url '{}' must start with 'http://' or 'https://'",
                upstream.base_url
            )));
        }
        if upstream.api_key_env.trim().is_empty() {
            return Err(AppError::Config(
                "upstream.api_key_env cannot be empty".to_string(),
            ));
        }

        for (name, timeout) in [
            ("chat_timeout_seconds", upstream.chat_timeout_seconds),
            ("image_timeout_seconds", upstream.image_timeout_seconds),
        ] {
            if timeout == 0 {
                return Err(AppError::Config(format!(
                    "upstream.{} must be greater than 0",
                    name
                )));
            }
            if timeout > MAX_TIMEOUT_SECONDS {
                return Err(AppError::Config(format!(
                    "upstream.{} cannot exceed {} seconds, got {}",
                    name, MAX_TIMEOUT_SECONDS, timeout
                )));
            }
        }

        self.retry.policy()?;

        let completion = &self.completion;
        if !crate::router::is_allowed(&completion.model) {
            return Err(AppError::Config(format!(
                "completion.model '{}' is not one of the supported models: {}",
                completion.model,
                crate::router::ALLOWED_MODELS.join(", ")
            )));
        }
        if !completion.temperature.is_finite() || !(0.0..=2.0).contains(&completion.temperature)
        {
            return Err(AppError::Config(format!(
                "completion.temperature must be a finite number between 0.0 and 2.0, got {}",
                completion.temperature
            )));
        }
        if completion.max_tokens == 0 {
            return Err(AppError::Config(
                "completion.max_tokens must be greater than 0".to_string(),
            ));
        }
        if completion.history_limit == 0 {
            return Err(AppError::Config(
                "completion.history_limit must be greater than 0".to_string(),
            ));
        }

        if self.documents.max_file_bytes == 0 {
            return Err(AppError::Config(
                "documents.max_file_bytes must be greater than 0".to_string(),
            ));
        }

        if self.session.display_name.trim().is_empty() {
            return Err(AppError::Config(
                "session.display_name cannot be blank".to_string(),
            ));
        }

        Ok(())
    }
}

impl FromStr for Config {
    type Err = AppError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Config =
            toml::from_str(toml_str).map_err(|source| AppError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_CONFIG: &str = r#"
[server]
host = "0.0.0.0"
port = 8080

[upstream]
base_url = "http://localhost:9999/v1"
api_key_env = "RELAY_TEST_KEY"
chat_timeout_seconds = 10
image_timeout_seconds = 20

[retry]
max_attempts = 5
base_backoff_ms = 100

[completion]
model = "gpt-3.5-turbo"
temperature = 1.2
max_tokens = 256
history_limit = 4

[documents]
max_file_bytes = 2048

[session]
display_name = "Ada"

[observability]
log_level = "debug"
"#;

    #[test]
    fn test_config_from_str_parses_successfully() {
        let config = Config::from_str(TEST_CONFIG).expect("should parse config");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.upstream.base_url, "http://localhost:9999/v1");
        assert_eq!(config.upstream.api_key_env, "RELAY_TEST_KEY");
        assert_eq!(config.upstream.chat_timeout(), Duration::from_secs(10));
        assert_eq!(config.upstream.image_timeout(), Duration::from_secs(20));
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.completion.model, "gpt-3.5-turbo");
        assert_eq!(config.completion.max_tokens, 256);
        assert_eq!(config.completion.history_limit, 4);
        assert_eq!(config.documents.max_file_bytes, 2048);
        assert_eq!(config.session.display_name, "Ada");
        assert_eq!(config.observability.log_level, "debug");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").expect("empty config should be valid");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.upstream.base_url, "https://api.openai.com/v1");
        assert_eq!(config.upstream.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.upstream.chat_timeout_seconds, 30);
        assert_eq!(config.upstream.image_timeout_seconds, 60);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_backoff_ms, 2_000);
        assert_eq!(config.completion.model, "gpt-4o-mini");
        assert_eq!(config.completion.temperature, 0.7);
        assert_eq!(config.completion.max_tokens, 1024);
        assert_eq!(config.completion.history_limit, 10);
        assert_eq!(config.documents.max_file_bytes, 10 * 1024 * 1024);
        assert_eq!(config.session.display_name, "User");
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_default_matches_empty_file() {
        let from_default = Config::default();
        let from_str = Config::from_str("").expect("valid");
        assert_eq!(from_default.server.port, from_str.server.port);
        assert_eq!(from_default.completion.model, from_str.completion.model);
        assert!(from_default.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let result = Config::from_str("[upstream]\nbase_url = \"ftp://example.com\"\n");
        let err = result.expect_err("should reject ftp url");
        assert!(err.to_string().contains("http://"));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let result = Config::from_str("[upstream]\nchat_timeout_seconds = 0\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_timeout_above_limit() {
        let result = Config::from_str("[upstream]\nimage_timeout_seconds = 301\n");
        let err = result.expect_err("should reject large timeout");
        assert!(err.to_string().contains("300"));
    }

    #[test]
    fn test_rejects_zero_attempts() {
        let result = Config::from_str("[retry]\nmax_attempts = 0\n");
        let err = result.expect_err("should reject zero attempts");
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn test_rejects_model_outside_allow_list() {
        let result = Config::from_str("[completion]\nmodel = \"gpt-4o\"\n");
        let err = result.expect_err("should reject unsupported default model");
        assert!(err.to_string().contains("gpt-4o-mini"));
    }

    #[test]
    fn test_rejects_out_of_range_temperature() {
        assert!(Config::from_str("[completion]\ntemperature = 2.5\n").is_err());
        assert!(Config::from_str("[completion]\ntemperature = -0.1\n").is_err());
        assert!(Config::from_str("[completion]\ntemperature = nan\n").is_err());
    }

    #[test]
    fn test_rejects_zero_max_tokens_and_history() {
        assert!(Config::from_str("[completion]\nmax_tokens = 0\n").is_err());
        assert!(Config::from_str("[completion]\nhistory_limit = 0\n").is_err());
    }

    #[test]
    fn test_rejects_blank_display_name() {
        assert!(Config::from_str("[session]\ndisplay_name = \"   \"\n").is_err());
    }

    #[test]
    fn test_parse_error_is_reported_with_string_path() {
        let err = Config::from_str("[server\nport = 1").expect_err("malformed TOML");
        match err {
            AppError::ConfigParseFailed { path, .. } => assert_eq!(path, "<string>"),
            other => panic!("expected ConfigParseFailed, got {:?}", other),
        }
    }
}
