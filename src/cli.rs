//! Argument handling for the `llmguard` binary
//!
//! `llmguard [truncate|complete] [FILE|-] [MODEL]`. Without a subcommand the
//! first argument is the conversation file and the conversation is truncated.

use crate::models::Message;
use crate::utils::error::{helpers::validation_error, GuardResult};
use std::io::Read;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Fit the conversation to the model's input budget and print it
    Truncate,
    /// Send the conversation to the configured endpoint and print the result
    Complete,
}

/// Parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: Command,
    /// Conversation path; `None` or `-` reads stdin
    pub input: Option<String>,
    pub model: Option<String>,
}

impl Invocation {
    /// Parse arguments, excluding the program name
    pub fn parse<I>(args: I) -> GuardResult<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter().peekable();

        let command = match args.peek().map(String::as_str) {
            Some("truncate") => Some(Command::Truncate),
            Some("complete") => Some(Command::Complete),
            _ => None,
        };
        if command.is_some() {
            args.next();
        }
        Self::positional(command.unwrap_or(Command::Truncate), args)
    }

    fn positional(command: Command, mut args: impl Iterator<Item = String>) -> GuardResult<Self> {
        let input = args.next();
        let model = args.next();
        if let Some(extra) = args.next() {
            return Err(validation_error(format!("Unexpected argument '{}'", extra)));
        }
        Ok(Self {
            command,
            input,
            model,
        })
    }

    pub fn reads_stdin(&self) -> bool {
        matches!(self.input.as_deref(), None | Some("-"))
    }
}

/// Load a conversation from `path`, or from stdin when it is `None` or `-`
pub fn read_conversation(path: Option<&str>) -> GuardResult<Vec<Message>> {
    let content = match path {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
        Some(path) => std::fs::read_to_string(path)?,
    };
    parse_conversation(&content)
}

/// Conversations are JSON arrays of `{"role", "content"}` objects
pub fn parse_conversation(content: &str) -> GuardResult<Vec<Message>> {
    Ok(serde_json::from_str(content)?)
}
