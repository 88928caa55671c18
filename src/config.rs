//! Configuration management for the orchestrator.
//!
//! Configuration can be set via environment variables:
//! - `OLLAMA_BASE_URL` - Optional. Ollama server URL. Defaults to `http://localhost:11434`.
//! - `OLLAMA_TIMEOUT_SECS` - Optional. Generation timeout. Defaults to `30`.
//! - `OLLAMA_PROBE_TIMEOUT_SECS` - Optional. Liveness probe timeout. Defaults to `2`.
//! - `OPENAI_BASE_URL` - Optional. OpenAI-compatible API URL. Defaults to `https://api.openai.com/v1`.
//! - `OPENAI_API_KEY` - Optional. Bearer token for the OpenAI-compatible API.
//! - `OPENAI_TIMEOUT_SECS` - Optional. Generation timeout. Defaults to `30`.
//! - `ANTHROPIC_BASE_URL` - Optional. Anthropic API URL. Defaults to `https://api.anthropic.com`.
//! - `ANTHROPIC_API_KEY` - Optional. Required for the Claude provider to be available.
//! - `ANTHROPIC_TIMEOUT_SECS` - Optional. Generation timeout. Defaults to `60`.
//! - `LLM_PROVIDER` - Optional. Provider for the server (`mock`, `ollama`, `openai`, `claude`). Unset means auto-detect.
//! - `LLM_MODEL` - Optional. Model for the server's provider.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `8000`.
//! - `RUNNER_HISTORY_CAPACITY` - Optional. Results kept per task runner. Defaults to `1000`.

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Ollama endpoint configuration.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    /// Timeout for `/api/generate`
    pub timeout: Duration,
    /// Timeout for the `/api/tags` liveness probe
    pub probe_timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(2),
        }
    }
}

/// OpenAI-compatible endpoint configuration.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub probe_timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(5),
        }
    }
}

/// Anthropic Messages API configuration.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ANTHROPIC_BASE_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Orchestrator configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub ollama: OllamaConfig,

    pub openai: OpenAiConfig,

    pub anthropic: AnthropicConfig,

    /// Provider pinned for the HTTP server (None = auto-detect)
    pub provider: Option<String>,

    /// Model pinned for the HTTP server
    pub model: Option<String>,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Maximum results a task runner keeps before evicting the oldest
    pub history_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama: OllamaConfig::default(),
            openai: OpenAiConfig::default(),
            anthropic: AnthropicConfig::default(),
            provider: None,
            model: None,
            host: "127.0.0.1".to_string(),
            port: 8000,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let ollama = OllamaConfig {
            base_url: lookup("OLLAMA_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.ollama.base_url),
            timeout: parse_secs(&lookup, "OLLAMA_TIMEOUT_SECS", defaults.ollama.timeout)?,
            probe_timeout: parse_secs(
                &lookup,
                "OLLAMA_PROBE_TIMEOUT_SECS",
                defaults.ollama.probe_timeout,
            )?,
        };

        let openai = OpenAiConfig {
            base_url: lookup("OPENAI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.openai.base_url),
            api_key: lookup("OPENAI_API_KEY").filter(|k| !k.is_empty()),
            timeout: parse_secs(&lookup, "OPENAI_TIMEOUT_SECS", defaults.openai.timeout)?,
            probe_timeout: defaults.openai.probe_timeout,
        };

        let anthropic = AnthropicConfig {
            base_url: lookup("ANTHROPIC_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.anthropic.base_url),
            api_key: lookup("ANTHROPIC_API_KEY").filter(|k| !k.is_empty()),
            timeout: parse_secs(&lookup, "ANTHROPIC_TIMEOUT_SECS", defaults.anthropic.timeout)?,
        };

        let history_capacity: usize =
            parse_var(&lookup, "RUNNER_HISTORY_CAPACITY", defaults.history_capacity)?;
        if history_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "RUNNER_HISTORY_CAPACITY".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            ollama,
            openai,
            anthropic,
            provider: lookup("LLM_PROVIDER").filter(|p| !p.trim().is_empty()),
            model: lookup("LLM_MODEL").filter(|m| !m.trim().is_empty()),
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT", defaults.port)?,
            history_capacity,
        })
    }

    /// Point the Ollama provider at a different server (useful for testing).
    pub fn with_ollama_url(mut self, base_url: impl Into<String>) -> Self {
        self.ollama.base_url = base_url.into();
        self
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(key.to_string(), format!("{}", e))),
        None => Ok(default),
    }
}

fn parse_secs<F>(lookup: &F, key: &str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let secs: f64 = parse_var(lookup, key, default.as_secs_f64())?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(ConfigError::InvalidValue(
            key.to_string(),
            "must be a positive number of seconds".to_string(),
        ));
    }
    Ok(Duration::from_secs_f64(secs))
}
