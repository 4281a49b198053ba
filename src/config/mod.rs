//! Configuration management module
//!
//! Environment settings and the model catalog

pub mod catalog;
pub mod settings;

pub use catalog::{ModelCatalog, ModelInfo, DEFAULT_MAX_INPUT_TOKENS};
pub use settings::Settings;
