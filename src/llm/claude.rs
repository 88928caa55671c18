//! Claude provider over the Anthropic Messages API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{GenerationOptions, GenerationResponse, LlmError, Provider};
use crate::config::AnthropicConfig;

const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 1024;
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct ClaudeProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<MessagesRequestMessage<'a>>,
    #[serde(flatten)]
    extra: &'a serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct MessagesRequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl ClaudeProvider {
    pub const NAME: &'static str = "claude";
    pub const DEFAULT_MODEL: &'static str = "claude-3-sonnet-20240229";

    pub fn new(config: &AnthropicConfig, model: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: model.unwrap_or_else(|| Self::DEFAULT_MODEL.to_string()),
            timeout: config.timeout,
        }
    }
}

#[async_trait]
impl Provider for ClaudeProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn model(&self) -> &str {
        &self.model
    }

    /// Configured iff an API key is present; no request is made.
    async fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GenerationResponse, LlmError> {
        let Some(api_key) = &self.api_key else {
            return Err(LlmError::unavailable(
                "Claude provider is not configured: set ANTHROPIC_API_KEY",
            ));
        };

        let model = options.model.as_deref().unwrap_or(&self.model);
        let body = MessagesRequest {
            model,
            max_tokens: options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: options.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            messages: vec![MessagesRequestMessage {
                role: "user",
                content: prompt,
            }],
            extra: &options.extra,
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .timeout(self.timeout)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                LlmError::unavailable_with_source(format!("Claude request failed: {}", e), e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::http_status("Claude", status.as_u16(), &text));
        }

        let parsed: MessagesResponse = response.json().await.map_err(|e| {
            LlmError::unavailable_with_source(
                format!("Claude API returned an unreadable body: {}", e),
                e,
            )
        })?;

        let content = parsed
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .find_map(|block| block.text)
            .ok_or_else(|| LlmError::Internal("No text content in response".to_string()))?;

        Ok(GenerationResponse {
            provider: Self::NAME.to_string(),
            model: parsed.model.unwrap_or_else(|| model.to_string()),
            content,
            prompt: prompt.to_string(),
            fallback: None,
        })
    }
}
