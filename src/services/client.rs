//! Guarded completion client
//!
//! Runs one completion call with the conversation fitted to the model's
//! budget, the call bounded by a deadline, and its cost attached.

use crate::config::{ModelCatalog, Settings};
use crate::models::openai::{ChatRequest, ChatResponse};
use crate::models::{LlmResult, Message};
use crate::providers::{CompletionProvider, OpenAIProvider};
use crate::services::cost::completion_cost;
use crate::services::timeout::TimeoutGuard;
use crate::services::truncation::Truncator;
use crate::utils::error::{ErrorContext, GuardResult};
use crate::utils::logging::conversation_log_summary;
use std::sync::Arc;
use tracing::{debug, info};

/// Completion client with truncation, a call deadline and cost accounting
#[derive(Clone)]
pub struct GuardedClient {
    provider: Arc<dyn CompletionProvider>,
    truncator: Truncator,
    guard: TimeoutGuard,
}

impl GuardedClient {
    pub fn new(provider: Arc<dyn CompletionProvider>, catalog: Arc<ModelCatalog>, guard: TimeoutGuard) -> Self {
        Self {
            provider,
            truncator: Truncator::new(catalog),
            guard,
        }
    }

    /// Build an OpenAI-backed client from settings
    pub fn from_settings(settings: &Settings, catalog: Arc<ModelCatalog>) -> GuardResult<Self> {
        let provider = OpenAIProvider::from_config(&settings.provider)
            .config_context("Failed to create provider")?;
        let guard = TimeoutGuard::from_secs_f64(settings.guard.call_timeout_secs)?;
        Ok(Self::new(Arc::new(provider), catalog, guard))
    }

    pub fn catalog(&self) -> &ModelCatalog {
        self.truncator.catalog()
    }

    /// Send `messages` to `model` and wrap the response with its cost.
    ///
    /// The result is not validated; callers that check the response against
    /// a schema mark it with [`LlmResult::mark_validated`].
    pub async fn complete(
        &self,
        model: &str,
        messages: Vec<Message>,
        from_agent: bool,
    ) -> GuardResult<LlmResult<ChatResponse>> {
        self.send(ChatRequest::new(model, messages), from_agent).await
    }

    /// Like [`GuardedClient::complete`] with a caller-built request
    pub async fn send(&self, mut request: ChatRequest, from_agent: bool) -> GuardResult<LlmResult<ChatResponse>> {
        let messages = std::mem::take(&mut request.messages);
        request.messages = self.truncator.truncate(messages, &request.model, from_agent)?;

        debug!(
            provider = self.provider.name(),
            summary = %conversation_log_summary(&request.messages),
            "Sending guarded completion"
        );

        let model = request.model.clone();
        let provider = Arc::clone(&self.provider);
        let response = self
            .guard
            .call_async(async move {
                provider
                    .chat_complete(request)
                    .await
                    .external_api_context("Completion call failed")
            })
            .await?;

        let total_cost = completion_cost(self.catalog(), &model, &response.usage);
        info!(
            model = %model,
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            total_cost,
            "Completion finished"
        );

        LlmResult::new(response, total_cost, false)
    }
}
