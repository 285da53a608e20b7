use std::sync::Arc;

use crate::config::BehaviorConfig;
use crate::platform::IncomingMessage;
use crate::random::RandomSource;
use crate::triage::MessageContext;

/// Cheap checks applied before any analysis: empty text, bot commands and
/// (outside private chats) very short messages never go further.
pub fn passes_prefilter(message: &IncomingMessage, min_group_tokens: usize) -> bool {
    let text = message.text.trim();
    if text.is_empty() || text.starts_with('/') {
        return false;
    }
    message.kind.is_private() || text.split_whitespace().count() >= min_group_tokens
}

/// Decides whether a message that passed the pre-filter gets a reply.
pub struct ResponseGate {
    keyword_rate: f64,
    baseline_rate: f64,
    rng: Arc<dyn RandomSource>,
}

impl ResponseGate {
    pub fn new(behavior: &BehaviorConfig, rng: Arc<dyn RandomSource>) -> Self {
        Self {
            keyword_rate: behavior.keyword_response_rate,
            baseline_rate: behavior.baseline_response_rate,
            rng,
        }
    }

    pub fn should_respond(&self, ctx: &MessageContext) -> bool {
        if ctx.message.kind.is_private() {
            return true;
        }
        if ctx.sentiment.needs_empathy() || ctx.sentiment.is_question {
            return true;
        }
        if ctx.sentiment.needs_celebration() {
            return true;
        }
        let rate = if ctx.has_keywords() {
            self.keyword_rate
        } else {
            self.baseline_rate
        };
        self.rng.next_f64() < rate
    }
}
