//! Service layer module
//!
//! Timeout guard, conversation truncation, cost accounting and the guarded client

pub mod client;
pub mod cost;
pub mod timeout;
pub mod truncation;

pub use client::GuardedClient;
pub use cost::completion_cost;
pub use timeout::{call_with_timeout, call_with_timeout_async, Elapsed, TimeoutGuard};
pub use truncation::{conversation_tokens, truncate_messages, TruncationReport, Truncator};
