use serde_json::json;

use crate::types::ChatResponse;
use crate::{read_json, EvidenceError, Result};

const BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: BASE_URL.to_string(),
        }
    }
}

/// Minimal chat-completions client.
pub struct OpenAiChat {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiChat {
    pub fn new(client: reqwest::Client, config: OpenAiConfig) -> Self {
        Self { client, config }
    }

    /// Single-turn completion. Returns the assistant message content.
    pub async fn complete(&self, system: &str, user: &str, max_tokens: u32) -> Result<String> {
        let body = json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "temperature": 0.0,
            "max_tokens": max_tokens,
        });

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let data: ChatResponse = read_json(resp).await?;
        data.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| EvidenceError::Parse("completion returned no choices".into()))
    }
}
