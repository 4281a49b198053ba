//! Provider module
//!
//! Defines the completion provider trait and its implementations

pub mod openai;

use crate::models::openai::{ChatRequest, ChatResponse};
use anyhow::Result;
use async_trait::async_trait;

/// Upstream completion API
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Send a chat completion request
    async fn chat_complete(&self, request: ChatRequest) -> Result<ChatResponse>;
}

pub use openai::OpenAIProvider;
