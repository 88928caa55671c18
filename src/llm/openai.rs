//! OpenAI-compatible chat completions provider (OpenAI, LocalAI, LM Studio, ...).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{GenerationOptions, GenerationResponse, LlmError, Provider};
use crate::config::OpenAiConfig;

const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 1024;

pub struct OpenAiCompatibleProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    timeout: Duration,
    probe_timeout: Duration,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatCompletionMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
    #[serde(flatten)]
    extra: &'a serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct ChatCompletionMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiCompatibleProvider {
    pub const NAME: &'static str = "openai";
    pub const DEFAULT_MODEL: &'static str = "gpt-3.5-turbo";

    pub fn new(config: &OpenAiConfig, model: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: model.unwrap_or_else(|| Self::DEFAULT_MODEL.to_string()),
            timeout: config.timeout,
            probe_timeout: config.probe_timeout,
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("Authorization", format!("Bearer {}", key)),
            None => request,
        }
    }
}

#[async_trait]
impl Provider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn model(&self) -> &str {
        &self.model
    }

    /// A 401 still counts as reachable: the API is up, only the key is missing.
    async fn is_available(&self) -> bool {
        let request = self
            .client
            .get(format!("{}/models", self.base_url))
            .timeout(self.probe_timeout);
        match self.authorize(request).send().await {
            Ok(response) => matches!(response.status().as_u16(), 200 | 401),
            Err(e) => {
                tracing::debug!("OpenAI-compatible probe at {} failed: {}", self.base_url, e);
                false
            }
        }
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GenerationResponse, LlmError> {
        let model = options.model.as_deref().unwrap_or(&self.model);
        let body = ChatCompletionRequest {
            model,
            messages: vec![ChatCompletionMessage {
                role: "user",
                content: prompt,
            }],
            temperature: options.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            extra: &options.extra,
        };

        let request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .timeout(self.timeout)
            .json(&body);
        let response = self.authorize(request).send().await.map_err(|e| {
            LlmError::unavailable_with_source(format!("OpenAI-compatible request failed: {}", e), e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::http_status("OpenAI-compatible", status.as_u16(), &text));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
            LlmError::unavailable_with_source(
                format!("OpenAI-compatible server returned an unreadable body: {}", e),
                e,
            )
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::Internal("No choices in response".to_string()))?;

        Ok(GenerationResponse {
            provider: Self::NAME.to_string(),
            model: parsed.model.unwrap_or_else(|| model.to_string()),
            content,
            prompt: prompt.to_string(),
            fallback: None,
        })
    }
}
