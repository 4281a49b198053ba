//! LLM call hardening library
//!
//! Timeout guard, prompt truncation to a model's input budget, a result
//! wrapper carrying cost and validity, and a typed invalid-output error.

pub mod cli;
pub mod config;
pub mod models;
pub mod providers;
pub mod services;
pub mod utils;

// Re-export common types
pub use config::{ModelCatalog, ModelInfo, Settings};
pub use models::{LlmResult, Message, ToolCall, Usage};
pub use providers::{CompletionProvider, OpenAIProvider};
pub use services::{
    call_with_timeout, call_with_timeout_async, completion_cost, truncate_messages, Elapsed,
    GuardedClient, TimeoutGuard, TruncationReport, Truncator,
};
pub use utils::error::{GuardError, GuardResult, InvalidOutputError};
pub use utils::tokenizer::{count_tokens, Tokenizer};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get version information
pub fn version_info() -> String {
    format!("{} v{}", NAME, VERSION)
}
