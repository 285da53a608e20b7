mod bot;
mod config;
mod conversation_log;
mod engine;
mod llm;
mod pipeline;
mod platform;
mod prompt;
mod random;
mod triage;

#[cfg(test)]
mod testing;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::bot::AppState;
use crate::config::Config;
use crate::conversation_log::{ConversationLogger, JsonlLogSink};
use crate::engine::ConversationEngine;
use crate::llm::LlmClient;
use crate::pipeline::MessagePipeline;
use crate::platform::telegram::TelegramMessenger;
use crate::prompt::PromptAssembler;
use crate::random::{RandomSource, ThreadRandom};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,visabuddy=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Provider: {} ({})", config.llm.provider, config.llm.model);
    info!("  Operator chat: {:?}", config.telegram.operator_chat_id);
    info!("  Conversation log: {}", config.conversation_log.path.display());
    info!(
        "  Group reply rates: keywords={} baseline={}",
        config.behavior.keyword_response_rate, config.behavior.baseline_response_rate
    );

    let prompts = PromptAssembler::from_config(&config.persona)?;
    let rng: Arc<dyn RandomSource> = Arc::new(ThreadRandom);
    let messenger = Arc::new(TelegramMessenger::new(&config.telegram.bot_token));

    let engine = ConversationEngine::new(
        Arc::new(LlmClient::new(config.llm.clone())),
        prompts,
        rng.clone(),
        Duration::from_secs(config.llm.timeout_secs),
        config.behavior.group_reply_max_chars,
    );
    let logger = ConversationLogger::new(
        Arc::new(JsonlLogSink::new(config.conversation_log.path.clone())),
        messenger.clone(),
        config.telegram.operator_chat_id,
    );
    let pipeline = MessagePipeline::new(engine, logger, messenger, rng, config.behavior.clone());

    // Create shared state
    let state = Arc::new(AppState::new(pipeline, config.telegram.webhook_secret.clone()));

    info!("Bot is starting...");
    bot::run(state, &config.server.bind_address).await?;

    Ok(())
}
