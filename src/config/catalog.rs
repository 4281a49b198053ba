//! Model catalog
//!
//! Maps bare model names to their input-token budget and per-token prices.
//! Built-in entries can be extended or overridden from a JSON file.

use crate::utils::error::{helpers::config_error, ErrorContext, GuardResult};
use crate::utils::tokenizer::bare_model_name;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Budget assumed for models missing from the catalog
pub const DEFAULT_MAX_INPUT_TOKENS: usize = 8192;

/// (name, max input tokens, input cost per token, output cost per token)
const BUILTIN_MODELS: &[(&str, usize, f64, f64)] = &[
    ("gpt-3.5-turbo", 16385, 0.0000005, 0.0000015),
    ("gpt-4", 8192, 0.00003, 0.00006),
    ("gpt-4-32k", 32768, 0.00006, 0.00012),
    ("gpt-4-turbo", 128000, 0.00001, 0.00003),
    ("gpt-4o", 128000, 0.0000025, 0.00001),
    ("gpt-4o-mini", 128000, 0.00000015, 0.0000006),
    ("gpt-4.1", 1047576, 0.000002, 0.000008),
    ("gpt-4.1-mini", 1047576, 0.0000004, 0.0000016),
    ("o1", 200000, 0.000015, 0.00006),
    ("o3-mini", 200000, 0.0000011, 0.0000044),
    ("claude-3-haiku-20240307", 200000, 0.00000025, 0.00000125),
    ("claude-3-5-sonnet-20241022", 200000, 0.000003, 0.000015),
    ("claude-3-opus-20240229", 200000, 0.000015, 0.000075),
];

static BUILTIN_CATALOG: Lazy<Arc<ModelCatalog>> = Lazy::new(|| Arc::new(ModelCatalog::builtin()));

/// Metadata for one model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Maximum number of input tokens the model accepts
    #[serde(rename = "maxInputTokens")]
    pub max_input_tokens: usize,

    /// Price of one prompt token
    #[serde(rename = "inputCostPerToken", default)]
    pub input_cost_per_token: f64,

    /// Price of one completion token
    #[serde(rename = "outputCostPerToken", default)]
    pub output_cost_per_token: f64,
}

/// Catalog file layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    models: HashMap<String, ModelInfo>,
}

/// Model-metadata lookup keyed by bare model name
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    models: HashMap<String, ModelInfo>,
}

impl ModelCatalog {
    /// Catalog with no entries; every lookup uses the defaults
    pub fn empty() -> Self {
        Self::default()
    }

    /// Catalog holding the built-in entries
    pub fn builtin() -> Self {
        let models = BUILTIN_MODELS
            .iter()
            .map(|&(name, max_input_tokens, input, output)| {
                (
                    name.to_string(),
                    ModelInfo {
                        max_input_tokens,
                        input_cost_per_token: input,
                        output_cost_per_token: output,
                    },
                )
            })
            .collect();
        Self { models }
    }

    /// Process-wide shared built-in catalog
    pub fn shared_builtin() -> Arc<ModelCatalog> {
        Arc::clone(&BUILTIN_CATALOG)
    }

    /// Add or replace one entry
    pub fn insert(&mut self, name: impl Into<String>, info: ModelInfo) {
        self.models.insert(name.into(), info);
    }

    /// Look up a model; provider prefixes are stripped first
    pub fn get(&self, model: &str) -> Option<&ModelInfo> {
        self.models.get(bare_model_name(model))
    }

    /// Input-token budget for a model, [`DEFAULT_MAX_INPUT_TOKENS`] when unknown
    pub fn max_input_tokens(&self, model: &str) -> usize {
        self.get(model)
            .map(|info| info.max_input_tokens)
            .unwrap_or(DEFAULT_MAX_INPUT_TOKENS)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Overlay the entries of a JSON catalog file onto this catalog
    pub fn merge_file(&mut self, path: &Path) -> GuardResult<()> {
        info!("Loading model catalog from: {:?}", path);

        let content = std::fs::read_to_string(path)
            .config_context(&format!("Failed to read catalog file {:?}", path))?;
        let file: CatalogFile =
            serde_json::from_str(&content).config_context("Failed to parse catalog JSON")?;

        for (name, info) in &file.models {
            validate_entry(name, info)?;
        }

        debug!("Loaded {} catalog entries", file.models.len());
        self.models.extend(file.models);
        Ok(())
    }

    /// Built-in catalog overlaid with a JSON file
    pub fn load(path: &Path) -> GuardResult<Self> {
        let mut catalog = Self::builtin();
        catalog.merge_file(path)?;
        Ok(catalog)
    }

    /// Built-in catalog overlaid with the first catalog file found in:
    /// 1. ~/.config/llmguard/models.json
    /// 2. ./llmguard-models.json
    ///
    /// No file is not an error; the built-ins are returned alone.
    pub fn load_default() -> GuardResult<Self> {
        match default_catalog_path() {
            Some(path) => Self::load(&path),
            None => {
                debug!("No model catalog file found, using built-in entries");
                Ok(Self::builtin())
            }
        }
    }
}

fn default_catalog_path() -> Option<PathBuf> {
    if let Some(home) = dirs::home_dir() {
        let config_path = home.join(".config").join("llmguard").join("models.json");
        if config_path.exists() {
            return Some(config_path);
        }
    }

    let local_path = PathBuf::from("llmguard-models.json");
    local_path.exists().then_some(local_path)
}

fn validate_entry(name: &str, info: &ModelInfo) -> GuardResult<()> {
    if name.is_empty() {
        return Err(config_error("Catalog model names cannot be empty"));
    }
    if info.max_input_tokens == 0 {
        return Err(config_error(format!(
            "Model '{}' must have a positive maxInputTokens",
            name
        )));
    }
    for (label, cost) in [
        ("inputCostPerToken", info.input_cost_per_token),
        ("outputCostPerToken", info.output_cost_per_token),
    ] {
        if !cost.is_finite() || cost < 0.0 {
            return Err(config_error(format!(
                "Model '{}' has invalid {}: {}",
                name, label, cost
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_builtin_lookup() {
        let catalog = ModelCatalog::builtin();
        assert_eq!(catalog.max_input_tokens("gpt-4"), 8192);
        assert_eq!(catalog.max_input_tokens("gpt-4o"), 128000);
        assert_eq!(catalog.max_input_tokens("openai/gpt-4o"), 128000);
    }

    #[test]
    fn test_unknown_model_defaults() {
        let catalog = ModelCatalog::builtin();
        assert!(catalog.get("mystery-model").is_none());
        assert_eq!(catalog.max_input_tokens("mystery-model"), DEFAULT_MAX_INPUT_TOKENS);
        assert_eq!(ModelCatalog::empty().max_input_tokens("gpt-4o"), DEFAULT_MAX_INPUT_TOKENS);
    }

    #[test]
    fn test_merge_file_overrides_builtin() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            br#"{"models": {
                "gpt-4": {"maxInputTokens": 4096, "inputCostPerToken": 0.1, "outputCostPerToken": 0.2},
                "local-llama": {"maxInputTokens": 2048}
            }}"#,
        )
        .unwrap();

        let catalog = ModelCatalog::load(file.path()).unwrap();
        assert_eq!(catalog.max_input_tokens("gpt-4"), 4096);
        assert_eq!(catalog.max_input_tokens("ollama/local-llama"), 2048);
        assert_eq!(catalog.get("local-llama").unwrap().input_cost_per_token, 0.0);
        assert_eq!(catalog.max_input_tokens("gpt-4o"), 128000);
    }

    #[test]
    fn test_rejects_zero_budget() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"models": {"broken": {"maxInputTokens": 0}}}"#)
            .unwrap();

        assert!(ModelCatalog::load(file.path()).is_err());
    }

    #[test]
    fn test_rejects_negative_cost() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            br#"{"models": {"broken": {"maxInputTokens": 10, "inputCostPerToken": -1.0}}}"#,
        )
        .unwrap();

        assert!(ModelCatalog::load(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = ModelCatalog::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert_eq!(err.error_type(), "config_error");
    }
}
