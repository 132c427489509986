use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

impl Sender {
    pub fn as_str(self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Ai => "ai",
        }
    }
}

/// A single chat line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// ChatLog
// ---------------------------------------------------------------------------

/// Append-only chat for one session. Only a new game clears it, and then it
/// is re-seeded with a single opening line.
#[derive(Debug, Clone, Default)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
}

impl ChatLog {
    /// A log holding one AI message.
    pub fn seeded(opening: &str) -> Self {
        let mut log = Self::default();
        log.push(Sender::Ai, opening);
        log
    }

    /// Append a message and return a copy of it.
    pub fn push(&mut self, sender: Sender, text: impl Into<String>) -> ChatMessage {
        let msg = ChatMessage::new(sender, text);
        self.messages.push(msg.clone());
        msg
    }

    /// Drop everything and start over with `opening`.
    pub fn reset(&mut self, opening: &str) {
        *self = Self::seeded(opening);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}
