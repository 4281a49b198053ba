//! Logging utilities
//!
//! Subscriber setup and compact conversation summaries for debug logs

use crate::config::settings::LoggingConfig;
use crate::models::Message;

/// Set to true to log full message contents in debug summaries
pub const VERBOSE_CONVERSATION_LOGGING: bool = false;

/// Initialize the global tracing subscriber.
///
/// Text output colours levels, so truncation warnings render yellow on a
/// terminal. A subscriber that is already installed is left in place.
pub fn init_logging(config: &LoggingConfig) {
    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = if config.format == "json" {
        // JSON format logs (production environment)
        Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(config.level.as_str())
                .with_writer(std::io::stderr)
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .finish(),
        )
    } else {
        // Human readable format (development environment)
        Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(config.level.as_str())
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .finish(),
        )
    };

    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        tracing::debug!("Logging system initialized");
    }
}

/// Shorten a string to `max_chars` characters with a note about the rest
fn truncate_content(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((cut, _)) => format!(
            "{}... ({} chars truncated)",
            &s[..cut],
            s[cut..].chars().count()
        ),
        None => s.to_string(),
    }
}

/// Summary of a conversation for logging; long contents are shortened
pub fn conversation_log_summary(messages: &[Message]) -> serde_json::Value {
    if VERBOSE_CONVERSATION_LOGGING {
        return serde_json::to_value(messages).unwrap_or(serde_json::json!({"error": "serialize failed"}));
    }

    let filtered: Vec<serde_json::Value> = messages
        .iter()
        .map(|msg| {
            // System prompts are long and repetitive
            let max_chars = if msg.role == "system" { 100 } else { 200 };
            serde_json::json!({
                "role": msg.role,
                "content": truncate_content(&msg.content, max_chars),
            })
        })
        .collect();

    serde_json::Value::Array(filtered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_content_short_unchanged() {
        assert_eq!(truncate_content("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_content_multibyte() {
        let s = "日本語のテキストです";
        assert_eq!(truncate_content(s, 3), "日本語... (7 chars truncated)");
    }

    #[test]
    fn test_summary_shortens_long_messages() {
        let messages = vec![Message::system("s".repeat(500)), Message::user("short")];
        let summary = conversation_log_summary(&messages);

        let system = summary[0]["content"].as_str().unwrap();
        assert!(system.starts_with(&"s".repeat(100)));
        assert!(system.ends_with("(400 chars truncated)"));
        assert_eq!(summary[1]["content"], "short");
        assert_eq!(summary[1]["role"], "user");
    }
}
