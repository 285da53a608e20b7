//! Deterministic stand-ins for the external collaborators, shared by unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::conversation_log::{ConversationLogRecord, LogSink};
use crate::llm::TextGenerator;
use crate::platform::{ConversationKind, IncomingMessage, Messenger};
use crate::random::RandomSource;

pub fn message(kind: ConversationKind, text: &str) -> IncomingMessage {
    IncomingMessage {
        chat_id: if kind.is_private() { 42 } else { -100500 },
        sender_name: "Priya".to_string(),
        sender_id: Some(7),
        sender_handle: Some("priya_k".to_string()),
        text: text.to_string(),
        kind,
        chat_title: if kind.is_private() {
            "Private Chat".to_string()
        } else {
            "Newcomers Canada".to_string()
        },
    }
}

pub fn private_message(text: &str) -> IncomingMessage {
    message(ConversationKind::Private, text)
}

pub fn group_message(text: &str) -> IncomingMessage {
    message(ConversationKind::Group, text)
}

/// Replays the given draws in order, then repeats the last one.
pub struct SequenceRandom {
    draws: Mutex<VecDeque<f64>>,
    last: Mutex<f64>,
}

impl SequenceRandom {
    pub fn new(draws: &[f64]) -> Self {
        Self {
            draws: Mutex::new(draws.iter().copied().collect()),
            last: Mutex::new(draws.last().copied().unwrap_or(0.0)),
        }
    }
}

impl RandomSource for SequenceRandom {
    fn next_f64(&self) -> f64 {
        match self.draws.lock().unwrap().pop_front() {
            Some(x) => {
                *self.last.lock().unwrap() = x;
                x
            }
            None => *self.last.lock().unwrap(),
        }
    }

    fn pick(&self, len: usize) -> usize {
        ((self.next_f64() * len as f64) as usize).min(len - 1)
    }
}

pub enum StubBehavior {
    Reply(String),
    Fail,
    Hang,
}

pub struct StubGenerator {
    behavior: StubBehavior,
    pub prompts: Mutex<Vec<String>>,
}

impl StubGenerator {
    pub fn replying(text: &str) -> Self {
        Self::with(StubBehavior::Reply(text.to_string()))
    }

    pub fn failing() -> Self {
        Self::with(StubBehavior::Fail)
    }

    pub fn hanging() -> Self {
        Self::with(StubBehavior::Hang)
    }

    fn with(behavior: StubBehavior) -> Self {
        Self {
            behavior,
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.behavior {
            StubBehavior::Reply(text) => Ok(text.clone()),
            StubBehavior::Fail => anyhow::bail!("provider unavailable"),
            StubBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                anyhow::bail!("unreachable")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text(i64, String),
    Typing(i64),
}

#[derive(Default)]
pub struct RecordingMessenger {
    pub sent: Mutex<Vec<Sent>>,
    pub fail: bool,
}

impl RecordingMessenger {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn texts(&self) -> Vec<(i64, String)> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|s| match s {
                Sent::Text(id, text) => Some((*id, text.clone())),
                Sent::Typing(_) => None,
            })
            .collect()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        if self.fail {
            anyhow::bail!("network down");
        }
        self.sent
            .lock()
            .unwrap()
            .push(Sent::Text(chat_id, text.to_string()));
        Ok(())
    }

    async fn send_typing(&self, chat_id: i64) -> Result<()> {
        if self.fail {
            anyhow::bail!("network down");
        }
        self.sent.lock().unwrap().push(Sent::Typing(chat_id));
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySink {
    pub records: Mutex<Vec<ConversationLogRecord>>,
    pub fail: bool,
}

impl MemorySink {
    pub fn failing() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn records(&self) -> Vec<ConversationLogRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl LogSink for MemorySink {
    async fn append(&self, record: &ConversationLogRecord) -> Result<()> {
        if self.fail {
            anyhow::bail!("disk full");
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}
