//! llmguard command line
//!
//! `llmguard [FILE|-] [MODEL]` fits a conversation to a model's input budget
//! and prints it; `truncate` may be given explicitly as the first argument.
//! `llmguard complete [FILE|-] [MODEL]` sends it to the configured
//! OpenAI-compatible endpoint and prints the result.
//! Conversations are JSON arrays of `{"role", "content"}` objects.

use anyhow::{Context, Result};
use llmguard::cli::{read_conversation, Command, Invocation};
use llmguard::config::{ModelCatalog, Settings};
use llmguard::utils::logging::init_logging;
use llmguard::{GuardedClient, Truncator};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let invocation =
        Invocation::parse(std::env::args().skip(1)).context("Invalid command line")?;

    let settings = Settings::new().context("Failed to load settings")?;
    init_logging(&settings.logging);
    info!("{}", llmguard::version_info());

    let catalog = Arc::new(load_catalog(&settings)?);
    let model = invocation
        .model
        .clone()
        .unwrap_or_else(|| settings.guard.default_model.clone());

    let messages = read_conversation(invocation.input.as_deref()).with_context(|| {
        match invocation.input.as_deref() {
            Some(path) if !invocation.reads_stdin() => {
                format!("Failed to read conversation file: {}", path)
            }
            _ => "Failed to read conversation from stdin".to_string(),
        }
    })?;

    match invocation.command {
        Command::Truncate => {
            let truncated = Truncator::new(catalog)
                .truncate(messages, &model, false)
                .context("Failed to truncate conversation")?;
            println!("{}", serde_json::to_string_pretty(&truncated)?);
        }
        Command::Complete => {
            let client = GuardedClient::from_settings(&settings, catalog)
                .context("Failed to create completion client")?;
            let result = client
                .complete(&model, messages, false)
                .await
                .context("Completion failed")?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

fn load_catalog(settings: &Settings) -> Result<ModelCatalog> {
    let catalog = match &settings.guard.model_catalog {
        Some(path) => ModelCatalog::load(path),
        None => ModelCatalog::load_default(),
    };
    catalog.context("Failed to load model catalog")
}
