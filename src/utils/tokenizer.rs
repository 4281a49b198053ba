//! Tokenizer resolution and caching
//!
//! Resolves a tiktoken encoding by model name and caches it process-wide,
//! since loading a BPE table is far more expensive than encoding with it.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tiktoken_rs::CoreBPE;
use tracing::debug;

/// Model whose encoding is used when the requested one is unknown
pub const FALLBACK_TOKENIZER_MODEL: &str = "gpt-4o";

/// Tokenizer error type
#[derive(Debug, Error)]
pub enum TokenizerError {
    #[error("failed to load encoding for model {model}")]
    LoadEncoding {
        model: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed to decode tokens")]
    Decode {
        #[source]
        source: anyhow::Error,
    },
}

// Maps bare model name -> resolved encoder
static ENCODER_CACHE: Lazy<RwLock<HashMap<String, Arc<CoreBPE>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Strip a provider prefix: `"openai/gpt-4o"` becomes `"gpt-4o"`
pub fn bare_model_name(model: &str) -> &str {
    model.rsplit('/').next().unwrap_or(model)
}

fn resolve_encoder(model: &str) -> Result<Arc<CoreBPE>, TokenizerError> {
    if let Ok(cache) = ENCODER_CACHE.read() {
        if let Some(encoder) = cache.get(model) {
            return Ok(Arc::clone(encoder));
        }
    }

    let encoder = match tiktoken_rs::get_bpe_from_model(model) {
        Ok(bpe) => bpe,
        Err(_) => {
            debug!("No tokenizer for model {}, using {}", model, FALLBACK_TOKENIZER_MODEL);
            tiktoken_rs::get_bpe_from_model(FALLBACK_TOKENIZER_MODEL).map_err(|source| {
                TokenizerError::LoadEncoding {
                    model: model.to_string(),
                    source,
                }
            })?
        }
    };
    let encoder = Arc::new(encoder);

    if let Ok(mut cache) = ENCODER_CACHE.write() {
        debug!("📝 Caching tokenizer for model: {}", model);
        cache.insert(model.to_string(), Arc::clone(&encoder));
    }
    Ok(encoder)
}

/// Thin wrapper around a shared `tiktoken_rs::CoreBPE`
#[derive(Clone)]
pub struct Tokenizer {
    inner: Arc<CoreBPE>,
}

impl Tokenizer {
    /// Build a tokenizer for a model name, provider prefix allowed.
    /// Falls back to the `gpt-4o` encoding when the model is unknown.
    pub fn for_model(model: &str) -> Result<Self, TokenizerError> {
        let inner = resolve_encoder(bare_model_name(model))?;
        Ok(Self { inner })
    }

    /// Encode text to token ids. Special-token text is encoded as plain text.
    pub fn encode(&self, text: &str) -> Vec<u32> {
        self.inner.encode_ordinary(text)
    }

    /// Decode token ids back to text. Fails when the ids do not form valid UTF-8.
    pub fn decode(&self, tokens: &[u32]) -> Result<String, TokenizerError> {
        self.inner
            .decode(tokens.to_vec())
            .map_err(|source| TokenizerError::Decode { source })
    }

    pub fn count(&self, text: &str) -> usize {
        self.inner.encode_ordinary(text).len()
    }
}

impl fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tokenizer {{ inner: <CoreBPE> }}")
    }
}

/// Count tokens in `text` with the tokenizer for `model`
pub fn count_tokens(text: &str, model: &str) -> Result<usize, TokenizerError> {
    Ok(Tokenizer::for_model(model)?.count(text))
}
