//! OpenAI Provider implementation
//!
//! Standard OpenAI-compatible chat completions endpoint

use super::CompletionProvider;
use crate::config::settings::ProviderConfig;
use crate::models::openai::{ChatRequest, ChatResponse, OpenAIErrorResponse};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error};

/// OpenAI Provider
#[derive(Debug, Clone)]
pub struct OpenAIProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenAIProvider {
    /// Create a provider for `base_url` with an HTTP timeout in seconds
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("llmguard/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    /// Create a provider from settings; the API key must be configured
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .context("OPENAI_API_KEY environment variable not set")?;
        Self::new(config.base_url.clone(), api_key, config.timeout)
    }

    /// Build the request URL
    fn build_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl CompletionProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn chat_complete(&self, request: ChatRequest) -> Result<ChatResponse> {
        debug!("Sending chat completion request for model {}", request.model);

        let response = self
            .client
            .post(self.build_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();

        if status.is_success() {
            let chat_response: ChatResponse = response
                .json()
                .await
                .context("Failed to parse chat completion response")?;

            debug!("Chat completion request completed successfully");
            Ok(chat_response)
        } else {
            let error_text = response.text().await.unwrap_or_default();

            if let Ok(error_response) = serde_json::from_str::<OpenAIErrorResponse>(&error_text) {
                error!("OpenAI API error: {:?}", error_response.error);
                anyhow::bail!("OpenAI API error: {}", error_response.error.message);
            } else {
                error!("OpenAI API request failed: {} - {}", status, error_text);
                anyhow::bail!("OpenAI API request failed: {} - {}", status, error_text);
            }
        }
    }
}
