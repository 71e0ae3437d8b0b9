//! HTTP client for OpenAI-compatible chat-completion servers.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::Generator;
use crate::error::GenerationError;
use crate::types::{ChatMessage, ChatRequest, ChatResponse};

/// Instructions sent as the system message with every prompt.
pub const SYSTEM_PROMPT: &str = "You are a word-combining system.
Input: two words or concepts.
Task: produce exactly ONE combined result that merges both inputs.
Output rules:
- Output ONLY the combined result
- One word or short phrase
- Add ONLY ONE relevant emoji at the start
- No explanation
- No extra text
- If the result cannot be generated return: ❌ Failed
- Stop after the result.
Example: Fire + Water → 💨Steam";

/// Connection and sampling settings for [`ChatClient`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Base URL up to and including the version segment, e.g. `http://host/v1`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Whole-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000/v1".into()
}
fn default_api_key() -> String {
    "EMPTY".into()
}
fn default_model() -> String {
    "llama-3.1-8b-instruct".into()
}
fn default_max_tokens() -> u32 {
    20
}
fn default_temperature() -> f32 {
    0.7
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: default_api_key(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ChatConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_sampling(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Chat-completion client. Cheap to clone; clones share a connection pool.
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    config: ChatConfig,
    url: String,
}

impl ChatClient {
    pub fn new(config: ChatConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let url = config.completions_url();
        Ok(Self {
            client,
            config,
            url,
        })
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    fn request_for(&self, prompt: &str) -> ChatRequest {
        ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        }
    }

    /// Send one chat-completion request and return the raw response body.
    pub async fn complete(&self, req: &ChatRequest) -> Result<ChatResponse, GenerationError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.config.api_key)
            .json(req)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<ChatResponse>().await?)
    }
}

impl Generator for ChatClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        tracing::debug!(model = %self.config.model, prompt, "Requesting completion");

        let response = self.complete(&self.request_for(prompt)).await?;
        let content = response
            .first_content()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| GenerationError::EmptyCompletion(prompt.to_string()))?;

        tracing::debug!(prompt, content, "Completion received");
        Ok(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_local_inference_server() {
        let config = ChatConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000/v1");
        assert_eq!(config.api_key, "EMPTY");
        assert_eq!(config.model, "llama-3.1-8b-instruct");
        assert_eq!(config.max_tokens, 20);
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn config_deserializes_with_partial_fields() {
        let config: ChatConfig = serde_json::from_str(r#"{"model": "qwen2.5"}"#).unwrap();
        assert_eq!(config.model, "qwen2.5");
        assert_eq!(config.max_tokens, 20);
    }

    #[test]
    fn completions_url_ignores_trailing_slash() {
        let a = ChatConfig::default().with_base_url("http://llm:9000/v1/");
        let b = ChatConfig::default().with_base_url("http://llm:9000/v1");
        assert_eq!(a.completions_url(), "http://llm:9000/v1/chat/completions");
        assert_eq!(a.completions_url(), b.completions_url());
    }

    #[test]
    fn request_carries_persona_and_prompt() {
        let client = ChatClient::new(ChatConfig::default().with_sampling(12, 0.2)).unwrap();
        let req = client.request_for("Fire + Water");
        assert_eq!(req.messages.len(), 2);
        assert_eq!(req.messages[0], ChatMessage::system(SYSTEM_PROMPT));
        assert_eq!(req.messages[1].content, "Fire + Water");
        assert_eq!(req.max_tokens, 12);
        assert!(SYSTEM_PROMPT.contains("❌ Failed"));
    }
}
