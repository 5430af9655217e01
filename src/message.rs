use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

mod context;
mod entities;

pub use context::build_context_map;
pub use entities::{Author, Badge, ChatMessage, MessageFlag, Reward};

#[derive(Debug, Error)]
pub enum MessageParseError {
    #[error("Failed to read messages: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid message on line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// A message together with the line it was read from
#[derive(Debug, Clone)]
pub struct RecordedMessage {
    pub line: usize,
    pub message: ChatMessage,
}

/// Read a JSON-lines file with one [`ChatMessage`] per line.
///
/// Blank lines are skipped; the first malformed line aborts with its 1-based
/// line number.
pub fn parse_message_file(path: impl AsRef<Path>) -> Result<Vec<RecordedMessage>, MessageParseError> {
    let file = File::open(path)?;
    parse_messages(BufReader::new(file))
}

pub fn parse_messages(reader: impl BufRead) -> Result<Vec<RecordedMessage>, MessageParseError> {
    let mut messages = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let message = serde_json::from_str(&line).map_err(|source| MessageParseError::Json {
            line: idx + 1,
            source,
        })?;
        messages.push(RecordedMessage {
            line: idx + 1,
            message,
        });
    }

    tracing::debug!(count = messages.len(), "parsed messages");
    Ok(messages)
}
