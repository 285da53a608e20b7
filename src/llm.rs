use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LlmConfig;

/// Generative text completion: one prompt in, one reply out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

/// Client for any OpenAI-compatible `/chat/completions` endpoint.
pub struct LlmClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<ChatMessage> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: messages.to_vec(),
            max_tokens: self.config.max_tokens,
        };

        let url = format!("{}/chat/completions", self.config.effective_base_url());

        debug!("Sending request to {}: {}", self.config.provider, url);

        let mut builder = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request);
        if !self.config.api_key.is_empty() {
            builder = builder.header("Authorization", format!("Bearer {}", self.config.api_key));
        }

        let response = builder
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", self.config.provider))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("{} API error ({}): {}", self.config.provider, status, error_body);
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to parse {} response", self.config.provider))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .with_context(|| format!("No response from {}", self.config.provider))
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let messages = [ChatMessage {
            role: "user".to_string(),
            content: Some(prompt.to_string()),
        }];
        let reply = self.chat(&messages).await?;
        match reply.content {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => anyhow::bail!("{} returned an empty completion", self.config.provider),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> LlmClient {
        LlmClient::new(LlmConfig {
            base_url: server.uri(),
            api_key: "sk-test".to_string(),
            model: "test-model".to_string(),
            ..LlmConfig::default()
        })
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "Hey there!" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client_for(&server).complete("hi").await.unwrap();
        assert_eq!(reply, "Hey there!");
    }

    #[tokio::test]
    async fn test_error_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let err = client_for(&server).complete("hi").await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_empty_choices_and_empty_content_are_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;
        assert!(client_for(&server).complete("hi").await.is_err());

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "   " } }]
            })))
            .mount(&server)
            .await;
        assert!(client_for(&server).complete("hi").await.is_err());
    }

    #[tokio::test]
    async fn test_malformed_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;
        assert!(client_for(&server).complete("hi").await.is_err());
    }
}
