use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::platform::{ConversationKind, Messenger};
use crate::triage::sentiment::SentimentLabel;
use crate::triage::MessageContext;

const OPERATOR_KEYWORD_LIMIT: usize = 5;
const OPERATOR_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Normal,
}

/// One notable message, written once and never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationLogRecord {
    pub id: String,
    pub user_id: Option<i64>,
    pub user_name: String,
    pub username: Option<String>,
    pub text: String,
    pub keywords: Vec<String>,
    pub sentiment: SentimentLabel,
    pub chat_id: i64,
    pub chat_title: String,
    pub chat_kind: ConversationKind,
    pub timestamp: DateTime<Utc>,
    pub priority: Priority,
}

impl ConversationLogRecord {
    /// Priority is high exactly when the sender needs empathy.
    pub fn from_context(ctx: &MessageContext) -> Self {
        let msg = &ctx.message;
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: msg.sender_id,
            user_name: msg.sender_name.clone(),
            username: msg.sender_handle.clone(),
            text: msg.text.clone(),
            keywords: ctx.detection.to_vec(),
            sentiment: ctx.sentiment.label(),
            chat_id: msg.chat_id,
            chat_title: msg.chat_title.clone(),
            chat_kind: msg.kind,
            timestamp: Utc::now(),
            priority: if ctx.sentiment.needs_empathy() {
                Priority::High
            } else {
                Priority::Normal
            },
        }
    }

    /// Short summary posted to the operator chat.
    pub fn operator_summary(&self) -> String {
        let sender = match &self.username {
            Some(handle) => format!("{} (@{})", self.user_name, handle),
            None => self.user_name.clone(),
        };
        let keywords = if self.keywords.is_empty() {
            "none".to_string()
        } else {
            self.keywords
                .iter()
                .take(OPERATOR_KEYWORD_LIMIT)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        };
        let preview: String = self.text.chars().take(OPERATOR_PREVIEW_CHARS).collect();

        format!(
            "🚨 High priority message\n\
             From: {}\n\
             Keywords: {}\n\
             Message: {}\n\
             Sentiment: {}\n\
             Chat: {}\n\
             Time: {}",
            sender,
            keywords,
            preview,
            self.sentiment,
            self.chat_title,
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        )
    }
}

/// Durable, append-only record store.
#[async_trait]
pub trait LogSink: Send + Sync {
    async fn append(&self, record: &ConversationLogRecord) -> Result<()>;
}

/// Appends one JSON object per line to a local file.
pub struct JsonlLogSink {
    path: PathBuf,
    // Serializes appends so concurrent pipeline runs never interleave lines.
    lock: Mutex<()>,
}

impl JsonlLogSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        info!("Conversation log at: {}", path.display());
        Self {
            path,
            lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl LogSink for JsonlLogSink {
    async fn append(&self, record: &ConversationLogRecord) -> Result<()> {
        let mut line = serde_json::to_string(record).context("Failed to serialize log record")?;
        line.push('\n');

        let _guard = self.lock.lock().await;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open conversation log: {}", self.path.display()))?;
        file.write_all(line.as_bytes())
            .await
            .context("Failed to append conversation log record")?;
        file.flush().await.context("Failed to flush conversation log")?;
        Ok(())
    }
}

/// Records notable messages and escalates high-priority ones to an operator.
pub struct ConversationLogger {
    sink: Arc<dyn LogSink>,
    messenger: Arc<dyn Messenger>,
    operator_chat_id: Option<i64>,
}

impl ConversationLogger {
    pub fn new(
        sink: Arc<dyn LogSink>,
        messenger: Arc<dyn Messenger>,
        operator_chat_id: Option<i64>,
    ) -> Self {
        Self {
            sink,
            messenger,
            operator_chat_id,
        }
    }

    /// Never fails; append and forward errors are reported independently.
    pub async fn log(&self, record: &ConversationLogRecord) {
        match self.sink.append(record).await {
            Ok(()) => debug!("Logged record {} ({:?})", record.id, record.priority),
            Err(e) => error!("Failed to append conversation log record {}: {:#}", record.id, e),
        }

        if record.priority != Priority::High {
            return;
        }
        let Some(operator) = self.operator_chat_id else {
            return;
        };
        if let Err(e) = self
            .messenger
            .send_text(operator, &record.operator_summary())
            .await
        {
            error!(
                "Failed to forward record {} to operator chat {}: {:#}",
                record.id, operator, e
            );
        }
    }
}
