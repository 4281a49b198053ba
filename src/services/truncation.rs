//! Conversation truncation
//!
//! Keeps a conversation inside a model's input-token budget by cutting
//! tokens out of the middle of its longest message.

use crate::config::ModelCatalog;
use crate::models::Message;
use crate::utils::error::GuardResult;
use crate::utils::tokenizer::Tokenizer;
use std::sync::Arc;
use tracing::{debug, warn};

/// A conversation fits when its total is at most `budget - FIT_SLACK_TOKENS`
pub const FIT_SLACK_TOKENS: i64 = 100;

/// Tokens removed beyond the strict overflow when truncating
pub const OVERSHOOT_TOKENS: i64 = 200;

/// What a truncation pass did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TruncationReport {
    /// Index of the message whose content was cut
    pub message_index: usize,
    /// Tokens cut from that message
    pub tokens_removed: usize,
    /// Encoded length of that message before the cut
    pub message_tokens: usize,
    /// Conversation total before the cut
    pub prompt_tokens: usize,
    /// Budget the conversation was fitted to
    pub max_input_tokens: usize,
}

/// Sum of token counts of each message serialized as a JSON object.
///
/// Counting the serialized record rather than the bare content over-counts
/// slightly, which leaves headroom for the role and framing tokens.
pub fn conversation_tokens(messages: &[Message], model: &str) -> GuardResult<usize> {
    let tokenizer = Tokenizer::for_model(model)?;
    let mut total = 0;
    for message in messages {
        total += tokenizer.count(&serde_json::to_string(message)?);
    }
    Ok(total)
}

/// Fits conversations to model budgets from a [`ModelCatalog`]
#[derive(Debug, Clone)]
pub struct Truncator {
    catalog: Arc<ModelCatalog>,
}

impl Default for Truncator {
    fn default() -> Self {
        Self::new(ModelCatalog::shared_builtin())
    }
}

impl Truncator {
    pub fn new(catalog: Arc<ModelCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Return `messages` unchanged when they fit `model`, otherwise with the
    /// longest message's content cut down.
    pub fn truncate(
        &self,
        mut messages: Vec<Message>,
        model: &str,
        from_agent: bool,
    ) -> GuardResult<Vec<Message>> {
        self.truncate_in_place(&mut messages, model, from_agent)?;
        Ok(messages)
    }

    /// Truncate in place. Returns `None` when nothing had to be cut.
    pub fn truncate_in_place(
        &self,
        messages: &mut [Message],
        model: &str,
        from_agent: bool,
    ) -> GuardResult<Option<TruncationReport>> {
        if messages.is_empty() {
            return Ok(None);
        }

        let max_input_tokens = self.catalog.max_input_tokens(model);
        let prompt_tokens = conversation_tokens(messages, model)?;
        let budget = max_input_tokens as i64;
        let total = prompt_tokens as i64;

        if total <= budget - FIT_SLACK_TOKENS {
            debug!(prompt_tokens, max_input_tokens, "Conversation fits model budget");
            return Ok(None);
        }

        let message_index = longest_message_index(messages);
        let excess = (total - budget + OVERSHOOT_TOKENS) as usize;

        let tokenizer = Tokenizer::for_model(model)?;
        let encoded = tokenizer.encode(&messages[message_index].content);
        let tokens_to_remove = encoded.len().min(excess);
        let truncated = splice_middle(&tokenizer, &encoded, tokens_to_remove)?;

        let source = if from_agent { "Agent" } else { "User" };
        warn!(
            tokens_removed = tokens_to_remove,
            prompt_tokens,
            message_tokens = encoded.len(),
            model,
            "{} Warning: Cutting {} tokens from a prompt with {} tokens...",
            source,
            tokens_to_remove,
            prompt_tokens
        );

        messages[message_index].content = truncated;

        Ok(Some(TruncationReport {
            message_index,
            tokens_removed: tokens_to_remove,
            message_tokens: encoded.len(),
            prompt_tokens,
            max_input_tokens,
        }))
    }
}

/// Truncate with the built-in model catalog
pub fn truncate_messages(
    messages: Vec<Message>,
    model: &str,
    from_agent: bool,
) -> GuardResult<Vec<Message>> {
    Truncator::default().truncate(messages, model, from_agent)
}

/// Index of the message with the most characters; the first one wins ties
fn longest_message_index(messages: &[Message]) -> usize {
    let mut best = (0, 0);
    for (index, message) in messages.iter().enumerate() {
        let length = message.content.chars().count();
        if length > best.1 {
            best = (index, length);
        }
    }
    best.0
}

fn truncation_marker(tokens_removed: usize) -> String {
    format!(" ... [{} tokens truncated] ... ", tokens_removed)
}

/// Drop `tokens_to_remove / 2` tokens on each side of the midpoint and put
/// the marker in their place.
///
/// A cut can land inside a multi-byte character. The kept head then gives
/// up its last tokens, and the kept tail its first tokens, until each side
/// decodes on its own.
fn splice_middle(tokenizer: &Tokenizer, tokens: &[u32], tokens_to_remove: usize) -> GuardResult<String> {
    let mid = tokens.len() / 2;
    let half = tokens_to_remove / 2;
    let mut head_end = mid - half;
    let mut tail_start = mid + half;

    let head = loop {
        match tokenizer.decode(&tokens[..head_end]) {
            Ok(text) => break text,
            Err(_) if head_end > 0 => head_end -= 1,
            Err(e) => return Err(e.into()),
        }
    };
    let tail = loop {
        match tokenizer.decode(&tokens[tail_start..]) {
            Ok(text) => break text,
            Err(_) if tail_start < tokens.len() => tail_start += 1,
            Err(e) => return Err(e.into()),
        }
    };

    Ok(format!("{}{}{}", head, truncation_marker(tokens_to_remove), tail))
}
