use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::BehaviorConfig;
use crate::conversation_log::{ConversationLogRecord, ConversationLogger};
use crate::engine::ConversationEngine;
use crate::platform::{IncomingMessage, Messenger};
use crate::random::RandomSource;
use crate::triage::gate::{passes_prefilter, ResponseGate};
use crate::triage::MessageContext;

const PREVIEW_CHARS: usize = 60;

/// How one message run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Rejected by the pre-filter; nothing logged, nothing sent.
    Dropped,
    /// Passed triage but the gate chose not to reply.
    Silent,
    /// A reply was handed to the messenger.
    Responded,
}

/// Per-message orchestration: triage, logging, gating, generation, delivery.
pub struct MessagePipeline {
    engine: ConversationEngine,
    logger: ConversationLogger,
    gate: ResponseGate,
    messenger: Arc<dyn Messenger>,
    rng: Arc<dyn RandomSource>,
    behavior: BehaviorConfig,
}

impl MessagePipeline {
    pub fn new(
        engine: ConversationEngine,
        logger: ConversationLogger,
        messenger: Arc<dyn Messenger>,
        rng: Arc<dyn RandomSource>,
        behavior: BehaviorConfig,
    ) -> Self {
        let gate = ResponseGate::new(&behavior, rng.clone());
        Self {
            engine,
            logger,
            gate,
            messenger,
            rng,
            behavior,
        }
    }

    pub async fn process(&self, message: IncomingMessage) -> Outcome {
        if !passes_prefilter(&message, self.behavior.min_group_tokens) {
            debug!("Dropped message in chat {}", message.chat_id);
            return Outcome::Dropped;
        }

        let ctx = MessageContext::analyze(message);
        let preview: String = ctx.message.text.chars().take(PREVIEW_CHARS).collect();
        info!(
            "Message from {} in {} chat {}: {:?} keywords={:?} stressed={} positive={} question={}",
            ctx.message.sender_name,
            ctx.message.kind,
            ctx.message.chat_id,
            preview,
            ctx.detection.to_vec(),
            ctx.sentiment.stressed,
            ctx.sentiment.positive,
            ctx.sentiment.is_question,
        );

        if ctx.is_notable() {
            self.logger
                .log(&ConversationLogRecord::from_context(&ctx))
                .await;
        }

        if !self.gate.should_respond(&ctx) {
            debug!("Staying silent in chat {}", ctx.message.chat_id);
            return Outcome::Silent;
        }

        let reply = self.engine.generate_response(&ctx).await;
        let chat_id = ctx.message.chat_id;

        if let Err(e) = self.messenger.send_typing(chat_id).await {
            warn!("Failed to send typing indicator to chat {}: {:#}", chat_id, e);
        }
        tokio::time::sleep(self.reply_delay()).await;

        match self.messenger.send_text(chat_id, &reply).await {
            Ok(()) => info!("Replied in chat {} ({} chars)", chat_id, reply.chars().count()),
            Err(e) => warn!("Failed to deliver reply to chat {}: {:#}", chat_id, e),
        }
        Outcome::Responded
    }

    /// Uniform sample from the configured window, simulating typing time.
    fn reply_delay(&self) -> Duration {
        let min = self.behavior.reply_delay_min_secs;
        let max = self.behavior.reply_delay_max_secs;
        Duration::from_secs_f64(min + self.rng.next_f64() * (max - min))
    }
}
