//! Error handling module
//!
//! Defines the crate error type and the typed error for malformed model output

use crate::models::{Message, ToolCall};
use crate::services::timeout::Elapsed;
use crate::utils::tokenizer::TokenizerError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum GuardError {
    /// Guarded call exceeded its deadline
    #[error("Request timeout: {0}")]
    Timeout(#[from] Elapsed),

    /// Model output could not be parsed or failed its schema
    #[error("{0}")]
    InvalidOutput(Box<InvalidOutputError>),

    /// Tokenizer error
    #[error("Tokenizer error: {0}")]
    Tokenizer(#[from] TokenizerError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Argument validation failed
    #[error("Validation failed: {0}")]
    Validation(String),

    /// External API error
    #[error("External API error: {0}")]
    ExternalApi(String),

    /// HTTP client error
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// File access error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GuardError {
    /// Get error type string
    pub fn error_type(&self) -> &'static str {
        match self {
            GuardError::Timeout(_) => "timeout_error",
            GuardError::InvalidOutput(_) => "invalid_output_error",
            GuardError::Tokenizer(_) => "tokenizer_error",
            GuardError::Config(_) => "config_error",
            GuardError::Validation(_) => "invalid_request_error",
            GuardError::ExternalApi(_) | GuardError::HttpClient(_) => "api_error",
            GuardError::Serialization(_) | GuardError::Io(_) | GuardError::Internal(_) => {
                "internal_error"
            }
        }
    }

    /// Whether the guard gave up waiting on the call
    pub fn is_timeout(&self) -> bool {
        matches!(self, GuardError::Timeout(_))
    }

    /// Borrow the invalid-output details, if this is that variant
    pub fn as_invalid_output(&self) -> Option<&InvalidOutputError> {
        match self {
            GuardError::InvalidOutput(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<InvalidOutputError> for GuardError {
    fn from(err: InvalidOutputError) -> Self {
        GuardError::InvalidOutput(Box::new(err))
    }
}

/// Result type alias
pub type GuardResult<T> = Result<T, GuardError>;

/// Raised by callers when a model's output is invalid or cannot be parsed.
///
/// Carries the raw output, the schema it was checked against, the full
/// conversation that produced it and any tool calls the model returned.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidOutputError {
    message: String,
    output: String,
    expected_schema: serde_json::Value,
    messages: Vec<Message>,
    tools: Option<Vec<ToolCall>>,
}

impl InvalidOutputError {
    pub fn new(
        message: impl Into<String>,
        output: impl Into<String>,
        expected_schema: serde_json::Value,
        messages: Vec<Message>,
        tools: Option<Vec<ToolCall>>,
    ) -> Self {
        Self {
            message: message.into(),
            output: output.into(),
            expected_schema,
            messages,
            tools,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn expected_schema(&self) -> &serde_json::Value {
        &self.expected_schema
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn tools(&self) -> Option<&[ToolCall]> {
        self.tools.as_deref()
    }
}

fn render_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!("<unserializable: {}>", e))
}

impl fmt::Display for InvalidOutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.message)?;
        writeln!(f, "Invalid output: {}", self.output)?;
        writeln!(f, "Expected schema: {}", self.expected_schema)?;
        writeln!(f, "Messages sent to LLM: {}", render_json(&self.messages))?;
        match &self.tools {
            Some(tools) => write!(f, "Tool calls generated by LLM: {}", render_json(tools)),
            None => write!(f, "Tool calls generated by LLM: None"),
        }
    }
}

impl std::error::Error for InvalidOutputError {}

/// Error handling helper functions
pub mod helpers {
    use super::*;

    /// Create validation error
    pub fn validation_error(message: impl Into<String>) -> GuardError {
        GuardError::Validation(message.into())
    }

    /// Create configuration error
    pub fn config_error(message: impl Into<String>) -> GuardError {
        GuardError::Config(message.into())
    }

    /// Create external API error
    pub fn external_api_error(message: impl Into<String>) -> GuardError {
        GuardError::ExternalApi(message.into())
    }

    /// Create internal error
    pub fn internal_error(message: impl Into<String>) -> GuardError {
        GuardError::Internal(message.into())
    }
}

/// Error context extension trait
pub trait ErrorContext<T> {
    /// Add configuration error context
    fn config_context(self, message: &str) -> GuardResult<T>;

    /// Add external API error context
    fn external_api_context(self, message: &str) -> GuardResult<T>;

    /// Add internal error context
    fn internal_context(self, message: &str) -> GuardResult<T>;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: fmt::Display,
{
    fn config_context(self, message: &str) -> GuardResult<T> {
        self.map_err(|e| GuardError::Config(format!("{}: {:#}", message, e)))
    }

    fn external_api_context(self, message: &str) -> GuardResult<T> {
        self.map_err(|e| GuardError::ExternalApi(format!("{}: {:#}", message, e)))
    }

    fn internal_context(self, message: &str) -> GuardResult<T> {
        self.map_err(|e| GuardError::Internal(format!("{}: {:#}", message, e)))
    }
}
