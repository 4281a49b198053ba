//! Conversation truncation tests

use llmguard::services::conversation_tokens;
use llmguard::{truncate_messages, Message, ModelCatalog, ModelInfo, Truncator};
use std::io::Write;
use std::sync::{Arc, Mutex};

const MARKER_TAIL: &str = "tokens truncated]";

/// ASCII filler of exactly `chars` characters made of distinct words
fn long_text(chars: usize) -> String {
    let mut text = String::with_capacity(chars + 16);
    let mut i = 0;
    while text.len() < chars {
        text.push_str(&format!("token{} ", i));
        i += 1;
    }
    text.truncate(chars);
    text
}

fn catalog_with(model: &str, max_input_tokens: usize) -> Arc<ModelCatalog> {
    let mut catalog = ModelCatalog::empty();
    catalog.insert(
        model,
        ModelInfo {
            max_input_tokens,
            input_cost_per_token: 0.0,
            output_cost_per_token: 0.0,
        },
    );
    Arc::new(catalog)
}

#[test]
fn test_small_conversation_returned_unchanged() {
    let messages = vec![
        Message::system("You are a helpful assistant."),
        Message::user("Summarize the attached notes."),
    ];
    let original = messages.clone();
    let ptr = messages.as_ptr();

    let result = truncate_messages(messages, "gpt-4", false).unwrap();

    assert_eq!(result, original);
    assert_eq!(result.as_ptr(), ptr);
}

#[test_log::test]
fn test_single_long_message_is_shortened() {
    let content = long_text(50_000);
    let messages = vec![Message::user(content.clone())];

    let result = truncate_messages(messages, "gpt-4", false).unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].role, "user");
    assert!(result[0].content.len() < content.len());
    assert!(result[0].content.contains(MARKER_TAIL));
    assert!(!result[0].content.contains(" ... [0 tokens truncated] ... "));
}

#[test]
fn test_only_longest_message_modified() {
    let messages = vec![
        Message::system("Extract every date mentioned in the document."),
        Message::user(long_text(60_000)),
        Message::assistant("Understood."),
    ];
    let original = messages.clone();

    let result = Truncator::default().truncate(messages, "gpt-4", true).unwrap();

    assert_eq!(result.len(), 3);
    assert_eq!(result[0], original[0]);
    assert_eq!(result[2], original[2]);
    assert_eq!(result[1].role, original[1].role);
    assert_ne!(result[1].content, original[1].content);
    assert!(result[1].content.contains(MARKER_TAIL));
}

#[test]
fn test_report_and_budget_for_known_model() {
    let mut messages = vec![Message::user(long_text(50_000))];
    let before = conversation_tokens(&messages, "gpt-4").unwrap();

    let report = Truncator::default()
        .truncate_in_place(&mut messages, "gpt-4", false)
        .unwrap()
        .expect("50k characters exceed the gpt-4 budget");

    assert_eq!(report.message_index, 0);
    assert_eq!(report.max_input_tokens, 8192);
    assert_eq!(report.prompt_tokens, before);
    assert_eq!(report.tokens_removed, before - 8192 + 200);
    assert!(report.tokens_removed <= report.message_tokens);
    assert!(messages[0]
        .content
        .contains(&format!(" ... [{} tokens truncated] ... ", report.tokens_removed)));
}

#[test]
fn test_second_pass_is_noop() {
    let truncator = Truncator::default();
    let mut messages = vec![Message::user(long_text(50_000))];

    assert!(truncator.truncate_in_place(&mut messages, "gpt-4", false).unwrap().is_some());
    let after_first = messages.clone();

    let second = truncator.truncate_in_place(&mut messages, "gpt-4", false).unwrap();
    assert!(second.is_none());
    assert_eq!(messages, after_first);
    assert!(conversation_tokens(&messages, "gpt-4").unwrap() <= 8192 - 100);
}

#[test]
fn test_first_longest_message_wins_tie() {
    let content = long_text(40_000);
    let messages = vec![Message::user(content.clone()), Message::user(content.clone())];

    let result = truncate_messages(messages, "gpt-4", false).unwrap();

    assert!(result[0].content.contains(MARKER_TAIL));
    assert_eq!(result[1].content, content);
}

#[test]
fn test_removal_caps_at_message_length() {
    let truncator = Truncator::new(catalog_with("tiny-model", 120));
    let content: String = (0..40).map(|i| format!("item{} ", i)).collect();
    let mut messages = vec![Message::user(content)];

    let report = truncator
        .truncate_in_place(&mut messages, "tiny-model", false)
        .unwrap()
        .expect("conversation exceeds a 120 token budget");

    assert_eq!(report.tokens_removed, report.message_tokens);
    assert!(messages[0].content.contains(&format!(
        " ... [{} tokens truncated] ... ",
        report.message_tokens
    )));
}

#[test]
fn test_unknown_model_uses_default_budget() {
    let mut messages = vec![Message::user(long_text(50_000))];

    let report = Truncator::default()
        .truncate_in_place(&mut messages, "mystery-model-7b", false)
        .unwrap()
        .expect("50k characters exceed the default budget");

    assert_eq!(report.max_input_tokens, 8192);
}

#[test]
fn test_provider_prefix_is_stripped() {
    let messages = vec![Message::user(long_text(50_000))];

    let bare = truncate_messages(messages.clone(), "gpt-4", false).unwrap();
    let prefixed = truncate_messages(messages, "openai/gpt-4", false).unwrap();

    assert_eq!(bare, prefixed);
}

#[test]
fn test_multibyte_content_stays_valid() {
    let content = "日本語のテキスト🙂 ".repeat(6_000);
    let messages = vec![Message::user(content.clone())];

    let result = truncate_messages(messages, "gpt-4", false).unwrap();

    assert!(result[0].content.contains(MARKER_TAIL));
    assert!(!result[0].content.contains('\u{FFFD}'));
    assert!(result[0].content.chars().count() < content.chars().count());
}

#[test]
fn test_content_fitting_budget_within_slack_untouched() {
    // Budget leaves exactly 100 tokens of slack above the total
    let messages = vec![Message::user("a short note")];
    let total = conversation_tokens(&messages, "edge-model").unwrap();
    let truncator = Truncator::new(catalog_with("edge-model", total + 100));

    let result = truncator.truncate(messages.clone(), "edge-model", false).unwrap();
    assert_eq!(result, messages);

    // One token less of budget tips it over
    let truncator = Truncator::new(catalog_with("edge-model", total + 99));
    let result = truncator.truncate(messages.clone(), "edge-model", false).unwrap();
    assert!(result[0].content.contains(MARKER_TAIL));
}

/// Log sink shared between a test and its subscriber
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn with_captured_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();

    let value = tracing::subscriber::with_default(subscriber, f);
    let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    (value, output)
}

#[test]
fn test_user_warning_reports_cut_and_total() {
    let truncator = Truncator::new(catalog_with("tiny-model", 300));
    let mut messages = vec![Message::user(long_text(4_000))];

    let (report, logs) = with_captured_logs(|| {
        truncator
            .truncate_in_place(&mut messages, "tiny-model", false)
            .unwrap()
    });

    let report = report.unwrap();
    let expected = format!(
        "User Warning: Cutting {} tokens from a prompt with {} tokens...",
        report.tokens_removed, report.prompt_tokens
    );
    assert!(logs.contains("WARN"), "logs: {}", logs);
    assert!(logs.contains(&expected), "logs: {}", logs);
    assert!(!logs.contains("Agent Warning"));
}

#[test]
fn test_agent_warning_label() {
    let truncator = Truncator::new(catalog_with("tiny-model", 300));
    let mut messages = vec![
        Message::system("Classify the log lines."),
        Message::user(long_text(4_000)),
    ];

    let (report, logs) = with_captured_logs(|| {
        truncator
            .truncate_in_place(&mut messages, "tiny-model", true)
            .unwrap()
    });

    let report = report.unwrap();
    let expected = format!(
        "Agent Warning: Cutting {} tokens from a prompt with {} tokens...",
        report.tokens_removed, report.prompt_tokens
    );
    assert!(logs.contains(&expected), "logs: {}", logs);
    assert!(!logs.contains("User Warning"));
}

#[test]
fn test_no_warning_when_conversation_fits() {
    let truncator = Truncator::new(catalog_with("tiny-model", 8_000));
    let mut messages = vec![Message::user("Short question?")];

    let (report, logs) = with_captured_logs(|| {
        truncator
            .truncate_in_place(&mut messages, "tiny-model", false)
            .unwrap()
    });

    assert!(report.is_none());
    assert!(!logs.contains("WARN"), "logs: {}", logs);
    assert!(!logs.contains("Warning: Cutting"));
}
