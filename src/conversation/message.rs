//! Transcript messages handed to the presentation layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who a message is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    Draft,
}

/// Where the message text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSource {
    User,
    /// Rendered from the template bank.
    PreWritten,
    /// Produced by an external model.
    AiGenerated,
    Draft,
}

/// One entry in the append-only transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: MessageRole,
    pub source: MessageSource,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: MessageRole, source: MessageSource, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            source,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, MessageSource::User, content)
    }

    /// Assistant text from the template bank.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, MessageSource::PreWritten, content)
    }

    /// Draft attributed to the generator that wrote it.
    pub fn draft_from(source: MessageSource, content: impl Into<String>) -> Self {
        Self::new(MessageRole::Draft, source, content)
    }
}
