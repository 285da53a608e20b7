use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::config::PersonaConfig;
use crate::triage::MessageContext;

const DEFAULT_PERSONA: &str = include_str!("prompts/persona.md");
const DEFAULT_KNOWLEDGE: &str = include_str!("prompts/knowledge.md");

const DATE_PLACEHOLDER: &str = "{date}";
const DEFAULT_SENDER_NAME: &str = "Friend";
const GENERAL_TOPIC: &str = "general chat";

const INSTRUCTIONS: &str = "\
Reply as Maya, in character. Match the energy of the message:
- Casual chat or reactions: 2-4 sentences.
- Specific immigration questions: 5-8 sentences with concrete, practical details from the knowledge above.
- If the person sounds stressed, reassure them first. If they share good news, celebrate with them.
- In group chats keep it short and do not repeat what others already said.
- Do not invent numbers that are not in the knowledge above; say when something should be checked on the official IRCC website.";

/// Builds the single prompt sent to the generative provider.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    persona: String,
    knowledge: String,
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_PERSONA, DEFAULT_KNOWLEDGE)
    }
}

impl PromptAssembler {
    pub fn new(persona: impl Into<String>, knowledge: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
            knowledge: knowledge.into(),
        }
    }

    /// Use the configured persona / knowledge files, falling back to the
    /// compiled-in texts for whichever is unset.
    pub fn from_config(config: &PersonaConfig) -> Result<Self> {
        let persona = match &config.persona_file {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read persona file: {}", path.display()))?,
            None => DEFAULT_PERSONA.to_string(),
        };
        let knowledge = match &config.knowledge_file {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read knowledge file: {}", path.display()))?,
            None => DEFAULT_KNOWLEDGE.to_string(),
        };
        Ok(Self::new(persona, knowledge))
    }

    pub fn build(&self, ctx: &MessageContext, today: NaiveDate) -> String {
        let date = today.format("%B %-d, %Y").to_string();
        let persona = self.persona.replace(DATE_PLACEHOLDER, &date);

        let topics = if ctx.detection.is_empty() {
            GENERAL_TOPIC.to_string()
        } else {
            ctx.detection.iter().collect::<Vec<_>>().join(", ")
        };
        let sender = match ctx.message.sender_name.trim() {
            "" => DEFAULT_SENDER_NAME,
            name => name,
        };
        let kind = if ctx.message.kind.is_private() {
            "private chat"
        } else {
            "group chat"
        };

        let mut prompt = String::with_capacity(
            persona.len() + self.knowledge.len() + ctx.message.text.len() + INSTRUCTIONS.len() + 256,
        );
        prompt.push_str(persona.trim_end());
        prompt.push_str("\n\n# Reference knowledge\n\n");
        prompt.push_str(self.knowledge.trim_end());
        prompt.push_str("\n\n# Current message\n\n");
        prompt.push_str(&format!("Message: {}\n", ctx.message.text));
        prompt.push_str(&format!("Conversation: {}\n", kind));
        prompt.push_str(&format!("Topics detected: {}\n", topics));
        prompt.push_str(&format!("Sender: {}\n", sender));
        prompt.push_str("\n# How to reply\n\n");
        prompt.push_str(INSTRUCTIONS);
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{group_message, private_message};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 7).unwrap()
    }

    #[test]
    fn test_sections_in_fixed_order() {
        let assembler = PromptAssembler::new("Persona on {date}.", "KNOWLEDGE BLOCK");
        let ctx = MessageContext::analyze(private_message("How long is express entry?"));
        let prompt = assembler.build(&ctx, date());

        let persona_at = prompt.find("Persona on March 7, 2026.").unwrap();
        let knowledge_at = prompt.find("KNOWLEDGE BLOCK").unwrap();
        let message_at = prompt.find("Message: How long is express entry?").unwrap();
        let instructions_at = prompt.find("2-4 sentences").unwrap();
        assert!(persona_at < knowledge_at);
        assert!(knowledge_at < message_at);
        assert!(message_at < instructions_at);
        assert!(prompt.contains("5-8 sentences"));
    }

    #[test]
    fn test_context_block_fields() {
        let assembler = PromptAssembler::default();
        let ctx = MessageContext::analyze(group_message("Canada visa and IELTS question"));
        let prompt = assembler.build(&ctx, date());
        assert!(prompt.contains("Conversation: group chat"));
        assert!(prompt.contains("Topics detected: canada, ielts, visa"));
        assert!(prompt.contains("Sender: Priya"));
        assert!(!prompt.contains("{date}"));
    }

    #[test]
    fn test_defaults_for_missing_topics_and_name() {
        let assembler = PromptAssembler::default();
        let mut msg = private_message("hello!");
        msg.sender_name = "  ".to_string();
        let prompt = assembler.build(&MessageContext::analyze(msg), date());
        assert!(prompt.contains("Topics detected: general chat"));
        assert!(prompt.contains("Sender: Friend"));
        assert!(prompt.contains("Conversation: private chat"));
    }

    #[test]
    fn test_deterministic_for_same_date() {
        let assembler = PromptAssembler::default();
        let ctx = MessageContext::analyze(private_message("work permit help"));
        assert_eq!(assembler.build(&ctx, date()), assembler.build(&ctx, date()));
    }

    #[test]
    fn test_from_config_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        let persona_path = dir.path().join("persona.md");
        std::fs::write(&persona_path, "Custom persona, {date}").unwrap();

        let assembler = PromptAssembler::from_config(&PersonaConfig {
            persona_file: Some(persona_path),
            knowledge_file: None,
        })
        .unwrap();
        let prompt = assembler.build(&MessageContext::analyze(private_message("hi")), date());
        assert!(prompt.starts_with("Custom persona, March 7, 2026"));
        assert!(prompt.contains("Express Entry"));

        let missing = PersonaConfig {
            persona_file: Some(dir.path().join("missing.md")),
            knowledge_file: None,
        };
        assert!(PromptAssembler::from_config(&missing).is_err());
    }
}
