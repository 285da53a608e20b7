use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use teloxide::prelude::*;
use teloxide::types::ChatAction;
use tracing::debug;

use crate::platform::{ConversationKind, IncomingMessage, Messenger};

/// Telegram rejects messages above 4096 characters; stay under it.
const MAX_MESSAGE_LEN: usize = 4000;

/// The subset of a Telegram `Update` the webhook cares about.
#[derive(Debug, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramMessage {
    #[serde(default)]
    pub chat: Option<TelegramChat>,
    #[serde(default)]
    pub from: Option<TelegramUser>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub chat_type: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

impl TelegramUpdate {
    /// Convert to a platform-agnostic message. `None` for updates that
    /// carry no message or no chat.
    pub fn into_incoming(self) -> Option<IncomingMessage> {
        let message = self.message?;
        let chat = message.chat?;

        let kind = if chat.chat_type == "private" {
            ConversationKind::Private
        } else {
            ConversationKind::Group
        };

        let (sender_id, sender_name, sender_handle) = match message.from {
            Some(user) => (Some(user.id), user.first_name, user.username),
            None => (None, String::new(), None),
        };

        Some(IncomingMessage {
            chat_id: chat.id,
            sender_name,
            sender_id,
            sender_handle,
            text: message.text.unwrap_or_default(),
            kind,
            chat_title: chat.title.unwrap_or_else(|| "Private Chat".to_string()),
        })
    }
}

/// Split long messages for Telegram's 4096 char limit
fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + max_len).min(text.len());
        // Walk back to a valid UTF-8 char boundary so slicing doesn't panic
        while end > start && !text.is_char_boundary(end) {
            end -= 1;
        }
        let actual_end = if end < text.len() {
            text[start..end]
                .rfind('\n')
                .or_else(|| text[start..end].rfind(' '))
                .map(|pos| start + pos + 1)
                .unwrap_or(end)
        } else {
            end
        };

        chunks.push(text[start..actual_end].to_string());
        start = actual_end;
    }

    chunks
}

/// Delivers replies and chat actions through the Telegram Bot API.
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot_token: &str) -> Self {
        Self {
            bot: Bot::new(bot_token),
        }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        for chunk in split_message(text, MAX_MESSAGE_LEN) {
            self.bot
                .send_message(ChatId(chat_id), chunk)
                .await
                .with_context(|| format!("Failed to send message to chat {}", chat_id))?;
        }
        debug!("Delivered {} chars to chat {}", text.len(), chat_id);
        Ok(())
    }

    async fn send_typing(&self, chat_id: i64) -> Result<()> {
        self.bot
            .send_chat_action(ChatId(chat_id), ChatAction::Typing)
            .await
            .with_context(|| format!("Failed to send typing action to chat {}", chat_id))?;
        Ok(())
    }
}
