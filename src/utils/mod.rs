//! Utilities module
//!
//! Error handling, logging and tokenizer tools

pub mod error;
pub mod logging;
pub mod tokenizer;
