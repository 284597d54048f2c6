//! Message and conversation history types.
//!
//! These are the value objects that flow through the pipeline:
//! user asks → session appends → pipeline reads a snapshot → assistant answer appended.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::language::Language;

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The assistant
    Assistant,
    /// Prompt instructions sent to the model; never stored in history
    System,
}

/// A single message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }
}

/// Default number of messages a conversation retains.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Ordered message history bounded to the most recent `limit` messages.
///
/// Owned by exactly one conversation session. The pipeline only ever sees
/// [`snapshot`](Self::snapshot)s; it never mutates history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    messages: Vec<Message>,
    limit: usize,
}

impl ConversationState {
    /// Create an empty history retaining at most `limit` messages (minimum 1).
    pub fn new(limit: usize) -> Self {
        Self {
            messages: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Create a history seeded with the language's welcome message.
    pub fn with_welcome(limit: usize, language: Language) -> Self {
        let mut state = Self::new(limit);
        state.append(Message::assistant(language.pack().welcome_message));
        state
    }

    /// Add a message to the tail, evicting the oldest messages beyond the limit.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
        if self.messages.len() > self.limit {
            let excess = self.messages.len() - self.limit;
            self.messages.drain(..excess);
        }
    }

    /// An owned copy of the current history, safe to hand to an in-flight request.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    /// Borrow the retained messages in order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Maximum number of retained messages.
    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}
