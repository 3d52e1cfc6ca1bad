//! Conversation data model
//!
//! A [`Conversation`] is an ordered list of [`Message`]s. Order is turn
//! order. Before a conversation goes upstream it is framed by exactly one
//! synthesized system message, see [`Conversation::framed`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Ordered sequence of messages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// A conversation holding one user message
    pub fn single(content: impl Into<String>) -> Self {
        Self::from_messages(vec![Message::user(content)])
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn has_user_message(&self) -> bool {
        self.messages.iter().any(|m| m.role == Role::User)
    }

    /// Content of the most recent user message
    pub fn last_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }

    /// The trailing `limit` messages, in order
    pub fn recent(&self, limit: usize) -> Conversation {
        let start = self.messages.len().saturating_sub(limit);
        Self::from_messages(self.messages[start..].to_vec())
    }

    /// The message list sent upstream
    ///
    /// Any system messages already present are dropped and a single
    /// synthesized one is placed at index 0.
    pub fn framed(&self, display_name: &str, today: NaiveDate) -> Vec<Message> {
        let mut framed = Vec::with_capacity(self.messages.len() + 1);
        framed.push(Message::system(system_prompt(display_name, today)));
        framed.extend(
            self.messages
                .iter()
                .filter(|m| m.role != Role::System)
                .cloned(),
        );
        framed
    }
}

impl From<Vec<Message>> for Conversation {
    fn from(messages: Vec<Message>) -> Self {
        Self::from_messages(messages)
    }
}

/// System prompt carrying the caller's name and the current date
pub fn system_prompt(display_name: &str, today: NaiveDate) -> String {
    format!(
        "You are a helpful AI assistant. The user's name is {}. Address them by their name \
        when appropriate and be friendly and conversational. Current date is {}.",
        display_name,
        today.format("%-m/%-d/%Y")
    )
}
