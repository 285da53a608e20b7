pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Whether a conversation is one-to-one or shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    Private,
    Group,
}

impl ConversationKind {
    pub fn is_private(self) -> bool {
        matches!(self, ConversationKind::Private)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConversationKind::Private => "private",
            ConversationKind::Group => "group",
        }
    }
}

impl std::fmt::Display for ConversationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message received from the chat platform
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingMessage {
    /// Conversation (chat) the message arrived in; replies go here
    pub chat_id: i64,
    /// Display name of the sender, may be empty
    pub sender_name: String,
    pub sender_id: Option<i64>,
    /// Platform handle without the leading `@`
    pub sender_handle: Option<String>,
    /// The message text
    pub text: String,
    pub kind: ConversationKind,
    pub chat_title: String,
}

/// Outbound side of the chat platform. Callers treat every failure as
/// best-effort: log it and move on.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()>;

    async fn send_typing(&self, chat_id: i64) -> Result<()>;
}
