//! Ollama provider for local inference servers.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{GenerationOptions, GenerationResponse, LlmError, Provider};
use crate::config::OllamaConfig;

const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Provider talking to an Ollama server over HTTP.
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
    probe_timeout: Duration,
}

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    response: String,
}

impl OllamaProvider {
    pub const NAME: &'static str = "ollama";
    pub const DEFAULT_MODEL: &'static str = "llama3";

    pub fn new(config: &OllamaConfig, model: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: model.unwrap_or_else(|| Self::DEFAULT_MODEL.to_string()),
            timeout: config.timeout,
            probe_timeout: config.probe_timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_options(options: &GenerationOptions) -> serde_json::Map<String, serde_json::Value> {
        let mut map = options.extra.clone();
        map.insert(
            "temperature".to_string(),
            serde_json::json!(options.temperature.unwrap_or(DEFAULT_TEMPERATURE)),
        );
        if let Some(max_tokens) = options.max_tokens {
            map.insert("num_predict".to_string(), serde_json::json!(max_tokens));
        }
        map
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self
            .client
            .get(&url)
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(e) => {
                tracing::debug!("Ollama probe at {} failed: {}", url, e);
                false
            }
        }
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GenerationResponse, LlmError> {
        if !self.is_available().await {
            return Err(LlmError::unavailable(format!(
                "Ollama endpoint at {} is not reachable. Please ensure Ollama is running.",
                self.base_url
            )));
        }

        let model = options.model.as_deref().unwrap_or(&self.model);
        let request = OllamaGenerateRequest {
            model,
            prompt,
            stream: false,
            options: Self::build_options(options),
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::unavailable_with_source(format!("Ollama request failed: {}", e), e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::http_status("Ollama", status.as_u16(), &body));
        }

        let parsed: OllamaGenerateResponse = response.json().await.map_err(|e| {
            LlmError::unavailable_with_source(format!("Ollama returned an unreadable body: {}", e), e)
        })?;

        Ok(GenerationResponse {
            provider: Self::NAME.to_string(),
            model: parsed.model.unwrap_or_else(|| model.to_string()),
            content: parsed.response,
            prompt: prompt.to_string(),
            fallback: None,
        })
    }
}
