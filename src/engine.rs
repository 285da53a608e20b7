use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use tracing::{debug, warn};

use crate::llm::TextGenerator;
use crate::prompt::PromptAssembler;
use crate::random::RandomSource;
use crate::triage::MessageContext;

const ELLIPSIS: &str = "...";

/// Used when the provider fails and the message was on-topic.
const VISA_FALLBACKS: &[&str] = &[
    "Ah, immigration questions! 😅 My brain is a bit fried right now, but the official IRCC website (canada.ca) has the most up-to-date info on this. I'll be back to my usual self soon!",
    "Good question! I'm having a little trouble thinking straight at the moment. For anything visa or permit related, double-check on canada.ca, and if your case is complicated a licensed consultant (RCIC) is worth it.",
    "I hear you, this stuff can be so confusing 🙏 I can't pull up the details right now, but the IRCC processing times and checklists on canada.ca are the best place to start. Ask me again in a bit!",
];

/// Used when the provider fails on general chatter.
const GENERIC_FALLBACKS: &[&str] = &[
    "Haha, sorry, I totally zoned out for a second! What were we talking about? 😄",
    "Oops, my head is somewhere else right now. Give me a minute and I'll be back! ☕",
    "Sorry, I'm a bit distracted at the moment! Tell me more?",
];

/// Turns a message context into reply text. Never fails: provider errors
/// and timeouts degrade to canned replies.
pub struct ConversationEngine {
    generator: Arc<dyn TextGenerator>,
    prompts: PromptAssembler,
    rng: Arc<dyn RandomSource>,
    timeout: Duration,
    group_max_chars: usize,
}

impl ConversationEngine {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        prompts: PromptAssembler,
        rng: Arc<dyn RandomSource>,
        timeout: Duration,
        group_max_chars: usize,
    ) -> Self {
        Self {
            generator,
            prompts,
            rng,
            timeout,
            group_max_chars,
        }
    }

    pub async fn generate_response(&self, ctx: &MessageContext) -> String {
        self.generate_response_on(ctx, Local::now().date_naive()).await
    }

    pub async fn generate_response_on(&self, ctx: &MessageContext, today: NaiveDate) -> String {
        let prompt = self.prompts.build(ctx, today);

        let reply = match tokio::time::timeout(self.timeout, self.generator.complete(&prompt)).await {
            Ok(Ok(text)) => text.trim().to_string(),
            Ok(Err(e)) => {
                warn!("Generative provider failed, using fallback: {:#}", e);
                return self.fallback(ctx);
            }
            Err(_) => {
                warn!(
                    "Generative provider timed out after {:?}, using fallback",
                    self.timeout
                );
                return self.fallback(ctx);
            }
        };

        if reply.is_empty() {
            warn!("Generative provider returned only whitespace, using fallback");
            return self.fallback(ctx);
        }

        if ctx.message.kind.is_private() {
            reply
        } else {
            truncate_chars(&reply, self.group_max_chars)
        }
    }

    fn fallback(&self, ctx: &MessageContext) -> String {
        let pool = if ctx.has_keywords() {
            VISA_FALLBACKS
        } else {
            GENERIC_FALLBACKS
        };
        let idx = self.rng.pick(pool.len());
        debug!("Selected fallback reply {} of {}", idx, pool.len());
        pool[idx].to_string()
    }
}

/// Cap `text` at `max` characters, marking the cut with an ellipsis.
fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(ELLIPSIS.len());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}
