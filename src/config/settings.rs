//! Application configuration settings
//!
//! Environment-driven settings with `.env` support

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Upstream provider configuration
    pub provider: ProviderConfig,
    /// Timeout guard and truncation configuration
    pub guard: GuardConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// OpenAI-compatible provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key, only needed when a provider is built
    pub api_key: Option<String>,
    /// API base URL
    pub base_url: String,
    /// HTTP client timeout in seconds
    pub timeout: u64,
}

/// Guarded call configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Deadline for one completion call in seconds
    pub call_timeout_secs: f64,
    /// Model used when none is given
    pub default_model: String,
    /// Explicit model catalog overlay file
    pub model_catalog: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (text/json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl Settings {
    /// Create a new configuration instance
    pub fn new() -> Result<Self> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        let settings = Self {
            provider: ProviderConfig {
                api_key: std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
                base_url: get_env_or_default("OPENAI_BASE_URL", "https://api.openai.com/v1"),
                timeout: get_env_or_default("HTTP_TIMEOUT", "60")
                    .parse()
                    .context("Invalid HTTP timeout value")?,
            },
            guard: GuardConfig {
                call_timeout_secs: get_env_or_default("LLMGUARD_CALL_TIMEOUT", "120")
                    .parse()
                    .context("Invalid call timeout value")?,
                default_model: get_env_or_default("LLMGUARD_MODEL", "gpt-4o"),
                model_catalog: std::env::var("LLMGUARD_MODEL_CATALOG")
                    .ok()
                    .filter(|p| !p.is_empty())
                    .map(PathBuf::from),
            },
            logging: LoggingConfig {
                level: get_env_or_default("RUST_LOG", "info"),
                format: get_env_or_default("LOG_FORMAT", "text"),
            },
        };

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration validity
    pub fn validate(&self) -> Result<()> {
        if let Some(api_key) = &self.provider.api_key {
            if api_key.contains(char::is_whitespace) {
                anyhow::bail!("API key cannot contain whitespace characters");
            }
        }

        if !self.provider.base_url.starts_with("http") {
            anyhow::bail!("Invalid base URL format, should start with 'http'");
        }

        if self.provider.timeout == 0 {
            anyhow::bail!("HTTP timeout cannot be 0");
        }

        if !self.guard.call_timeout_secs.is_finite() || self.guard.call_timeout_secs <= 0.0 {
            anyhow::bail!(
                "Call timeout must be a positive number of seconds, got {}",
                self.guard.call_timeout_secs
            );
        }

        if self.guard.default_model.trim().is_empty() {
            anyhow::bail!("Default model cannot be empty");
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!("Invalid log level: {}", self.logging.level);
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            anyhow::bail!("Invalid log format: {}", self.logging.format);
        }

        Ok(())
    }

    /// Completion call deadline as a duration
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.guard.call_timeout_secs)
    }
}

/// Get environment variable or default value
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
