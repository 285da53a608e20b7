use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Openrouter,
    Ollama,
    Openai,
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProvider::Openrouter => write!(f, "openrouter"),
            LlmProvider::Ollama => write!(f, "ollama"),
            LlmProvider::Openai => write!(f, "openai"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: LlmProvider,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Upper bound on a single completion call; expiry falls back to canned replies.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            model: default_model(),
            base_url: String::new(),
            api_key: String::new(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmConfig {
    /// Returns the effective base_url: if the stored value is empty,
    /// fall back to the canonical URL for the configured provider.
    pub fn effective_base_url(&self) -> &str {
        if !self.base_url.is_empty() {
            return &self.base_url;
        }
        match self.provider {
            LlmProvider::Openrouter => "https://openrouter.ai/api/v1",
            LlmProvider::Ollama => "http://localhost:11434/v1",
            LlmProvider::Openai => "https://api.openai.com/v1",
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub persona: PersonaConfig,
    #[serde(default)]
    pub behavior: BehaviorConfig,
    #[serde(default)]
    pub conversation_log: ConversationLogConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    /// Chat that receives high-priority conversation summaries.
    #[serde(default)]
    pub operator_chat_id: Option<i64>,
    /// Expected value of the `X-Telegram-Bot-Api-Secret-Token` header.
    #[serde(default)]
    pub webhook_secret: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

/// Optional external persona / knowledge texts. Compiled-in defaults are
/// used for whichever is not set.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct PersonaConfig {
    #[serde(default)]
    pub persona_file: Option<PathBuf>,
    #[serde(default)]
    pub knowledge_file: Option<PathBuf>,
}

/// Tunables for when and how the bot replies.
#[derive(Debug, Deserialize, Clone)]
pub struct BehaviorConfig {
    /// Group reply probability when domain keywords were detected.
    #[serde(default = "default_keyword_response_rate")]
    pub keyword_response_rate: f64,
    /// Group reply probability for everything else that reaches the gate.
    #[serde(default = "default_baseline_response_rate")]
    pub baseline_response_rate: f64,
    /// Group messages with fewer whitespace-separated tokens are dropped.
    #[serde(default = "default_min_group_tokens")]
    pub min_group_tokens: usize,
    #[serde(default = "default_reply_delay_min_secs")]
    pub reply_delay_min_secs: f64,
    #[serde(default = "default_reply_delay_max_secs")]
    pub reply_delay_max_secs: f64,
    #[serde(default = "default_group_reply_max_chars")]
    pub group_reply_max_chars: usize,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            keyword_response_rate: default_keyword_response_rate(),
            baseline_response_rate: default_baseline_response_rate(),
            min_group_tokens: default_min_group_tokens(),
            reply_delay_min_secs: default_reply_delay_min_secs(),
            reply_delay_max_secs: default_reply_delay_max_secs(),
            group_reply_max_chars: default_group_reply_max_chars(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConversationLogConfig {
    #[serde(default = "default_log_path")]
    pub path: PathBuf,
}

impl Default for ConversationLogConfig {
    fn default() -> Self {
        Self {
            path: default_log_path(),
        }
    }
}

fn default_model() -> String {
    "google/gemini-2.0-flash-001".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_keyword_response_rate() -> f64 {
    0.4
}

fn default_baseline_response_rate() -> f64 {
    0.1
}

fn default_min_group_tokens() -> usize {
    3
}

fn default_reply_delay_min_secs() -> f64 {
    1.0
}

fn default_reply_delay_max_secs() -> f64 {
    2.5
}

fn default_group_reply_max_chars() -> usize {
    500
}

fn default_log_path() -> PathBuf {
    PathBuf::from("conversations.jsonl")
}

impl Config {
    /// Load the config file (if present), apply environment overrides and validate.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_toml_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            warn!(
                "Config file {} not found, using defaults and environment",
                path.display()
            );
            Config::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid TOML configuration")
    }

    /// Secrets and deployment-specific values may come from the environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("TELEGRAM_BOT_TOKEN").filter(|v| !v.is_empty()) {
            self.telegram.bot_token = token;
        }
        if let Some(key) = lookup("LLM_API_KEY").filter(|v| !v.is_empty()) {
            self.llm.api_key = key;
        }
        if let Some(secret) = lookup("WEBHOOK_SECRET").filter(|v| !v.is_empty()) {
            self.telegram.webhook_secret = Some(secret);
        }
        if let Some(raw) = lookup("OPERATOR_CHAT_ID") {
            match raw.trim().parse::<i64>() {
                Ok(id) => self.telegram.operator_chat_id = Some(id),
                Err(_) => warn!("Ignoring non-numeric OPERATOR_CHAT_ID: {}", raw),
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.trim().is_empty() {
            anyhow::bail!("telegram.bot_token is empty (set it in the config or TELEGRAM_BOT_TOKEN)");
        }

        let b = &self.behavior;
        for (name, rate) in [
            ("keyword_response_rate", b.keyword_response_rate),
            ("baseline_response_rate", b.baseline_response_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                anyhow::bail!("behavior.{} must be within [0, 1], got {}", name, rate);
            }
        }
        if !b.reply_delay_min_secs.is_finite()
            || !b.reply_delay_max_secs.is_finite()
            || b.reply_delay_min_secs < 0.0
            || b.reply_delay_max_secs < b.reply_delay_min_secs
        {
            anyhow::bail!(
                "behavior reply delay window is invalid: [{}, {}]",
                b.reply_delay_min_secs,
                b.reply_delay_max_secs
            );
        }
        if b.group_reply_max_chars < 4 {
            anyhow::bail!("behavior.group_reply_max_chars must be at least 4");
        }

        info!("Configuration validated");
        Ok(())
    }
}
