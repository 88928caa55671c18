//! Provider orchestrator with auto-detection and offline fallback.
//!
//! # Selection
//! - Explicit provider at construction: built strictly (remote providers must
//!   answer their liveness probe) and never silently replaced.
//! - No provider at construction: Ollama is probed first; if it does not
//!   answer, the mock provider is adopted. Construction cannot fail.
//!
//! # Fallback
//! Only an auto-detected orchestrator serving a call without a per-call
//! provider override recovers from `ProviderUnavailable`, by re-issuing the
//! call to the mock provider and marking the response with `fallback: true`.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::llm::{
    AnyProvider, GenerationOptions, GenerationResponse, LlmError, MockProvider, Provider,
    ProviderFactory, ProviderKind,
};

/// Placeholder reported by `provider_info` for values never pinned.
pub const AUTO: &str = "auto";

/// Construction-time choices.
#[derive(Debug, Clone, Default)]
pub struct OrchestratorOptions {
    /// Provider name ("mock", "ollama", "openai", "claude"), or None to auto-detect
    pub provider: Option<String>,
    /// Model name (provider-specific)
    pub model: Option<String>,
}

impl OrchestratorOptions {
    pub fn provider(provider: impl Into<String>) -> Self {
        Self {
            provider: Some(provider.into()),
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// A single generation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Provider to use for this call only
    #[serde(default)]
    pub provider: Option<String>,
    /// Model to use for this call only
    #[serde(default)]
    pub model: Option<String>,
    /// Sampling temperature, 0.0 to 2.0
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Backend-specific parameters
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub options: serde_json::Map<String, serde_json::Value>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Check the request before any provider is touched.
    pub fn validate(&self) -> Result<(), LlmError> {
        if self.prompt.trim().is_empty() {
            return Err(LlmError::validation("Prompt cannot be empty"));
        }
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(LlmError::validation(format!(
                    "Temperature must be between 0.0 and 2.0, got {}",
                    t
                )));
            }
        }
        Ok(())
    }

    /// Per-call provider override, ignoring blank names.
    fn provider_override(&self) -> Option<&str> {
        self.provider
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            model: self.model.clone(),
            extra: self.options.clone(),
        }
    }
}

/// Currently recorded provider and model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderInfo {
    pub provider: String,
    pub model: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SelectionMode {
    Explicit,
    AutoDetect,
}

/// Provider-agnostic orchestrator.
pub struct Orchestrator {
    factory: ProviderFactory,
    mode: SelectionMode,
    provider: AnyProvider,
    model: Option<String>,
}

impl Orchestrator {
    /// Build an orchestrator, probing for a provider when none is named.
    ///
    /// # Errors
    ///
    /// - `LlmError::Validation` if the provider name is unknown
    /// - `LlmError::ProviderUnavailable` if an explicitly named remote provider is down
    pub async fn new(options: OrchestratorOptions, config: &Config) -> Result<Self, LlmError> {
        let factory = ProviderFactory::new(config.clone());
        let OrchestratorOptions { provider, model } = options;

        match provider.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            Some(name) => {
                let kind: ProviderKind = name.parse()?;
                let provider = factory.build_strict(kind, model.clone()).await?;
                tracing::info!("Using explicitly requested provider {}", kind);
                Ok(Self {
                    factory,
                    mode: SelectionMode::Explicit,
                    provider,
                    model,
                })
            }
            None => {
                let provider = Self::auto_detect(&factory, model.clone()).await;
                Ok(Self {
                    factory,
                    mode: SelectionMode::AutoDetect,
                    provider,
                    model,
                })
            }
        }
    }

    /// Ollama if it answers, the mock provider otherwise.
    async fn auto_detect(factory: &ProviderFactory, model: Option<String>) -> AnyProvider {
        let ollama = factory.build(ProviderKind::Ollama, model.clone());
        if ollama.is_available().await {
            tracing::info!("Auto-detected Ollama provider");
            return ollama;
        }
        tracing::info!("Ollama not reachable, using mock provider");
        factory.build(ProviderKind::Mock, model)
    }

    /// Whether the provider was chosen by auto-detection.
    pub fn is_auto_detected(&self) -> bool {
        self.mode == SelectionMode::AutoDetect
    }

    /// Generate a response for the request.
    ///
    /// # Errors
    ///
    /// - `LlmError::Validation` for an empty prompt, bad temperature or unknown provider
    /// - `LlmError::ProviderUnavailable` when the provider fails and no fallback applies
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, LlmError> {
        request.validate()?;
        let options = request.generation_options();

        let override_provider = match request.provider_override() {
            Some(name) => {
                let kind: ProviderKind = name.parse()?;
                Some(self.factory.build_strict(kind, self.model.clone()).await?)
            }
            None => None,
        };
        let provider = override_provider.as_ref().unwrap_or(&self.provider);

        match provider.generate(&request.prompt, &options).await {
            Ok(response) => Ok(response),
            Err(e) if e.is_unavailable() && self.may_fall_back(request) => {
                tracing::warn!(
                    "Provider {} failed ({}), falling back to mock",
                    provider.name(),
                    e
                );
                let mock = MockProvider::new(self.model.clone());
                let mut response = mock.generate(&request.prompt, &options).await?;
                response.fallback = Some(true);
                Ok(response)
            }
            Err(e) => Err(e),
        }
    }

    fn may_fall_back(&self, request: &GenerationRequest) -> bool {
        self.mode == SelectionMode::AutoDetect && request.provider_override().is_none()
    }

    /// Recorded provider and model. No I/O.
    pub fn provider_info(&self) -> ProviderInfo {
        ProviderInfo {
            provider: self.provider.name().to_string(),
            model: self.model.clone().unwrap_or_else(|| AUTO.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{spawn_stub, unreachable_url};
    use axum::{http::StatusCode, routing::get, routing::post, Json, Router};

    async fn offline_config() -> Config {
        Config::default().with_ollama_url(unreachable_url().await)
    }

    /// Ollama stub whose probe succeeds but whose generation endpoint fails.
    fn flaky_ollama() -> Router {
        Router::new()
            .route("/api/tags", get(|| async { Json(serde_json::json!({ "models": [] })) }))
            .route(
                "/api/generate",
                post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "overloaded") }),
            )
    }

    fn healthy_ollama() -> Router {
        Router::new()
            .route("/api/tags", get(|| async { Json(serde_json::json!({ "models": [] })) }))
            .route(
                "/api/generate",
                post(|| async { Json(serde_json::json!({ "model": "llama3", "response": "hi there" })) }),
            )
    }

    #[tokio::test]
    async fn test_explicit_mock_has_no_fallback() {
        let config = offline_config().await;
        let orch = Orchestrator::new(OrchestratorOptions::provider("mock"), &config)
            .await
            .unwrap();
        let response = orch.generate(&GenerationRequest::new("Hello")).await.unwrap();
        assert_eq!(response.provider, "mock");
        assert_eq!(response.content, "Mock response to: Hello...");
        assert_eq!(response.prompt, "Hello");
        assert!(response.fallback.is_none());
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("fallback").is_none());
    }

    #[tokio::test]
    async fn test_explicit_mock_with_model() {
        let config = offline_config().await;
        let orch = Orchestrator::new(
            OrchestratorOptions::provider("mock").with_model("demo"),
            &config,
        )
        .await
        .unwrap();
        let response = orch.generate(&GenerationRequest::new("Hello")).await.unwrap();
        assert!(response.content.contains("Hello"));
        assert_eq!(response.model, "demo");
        assert_eq!(response.provider, "mock");
        assert_eq!(
            orch.provider_info(),
            ProviderInfo {
                provider: "mock".into(),
                model: "demo".into()
            }
        );
    }

    #[tokio::test]
    async fn test_empty_prompts_rejected() {
        let config = offline_config().await;
        let orch = Orchestrator::new(OrchestratorOptions::provider("mock"), &config)
            .await
            .unwrap();
        for prompt in ["", "   ", "\n\t"] {
            let err = orch.generate(&GenerationRequest::new(prompt)).await.unwrap_err();
            assert!(matches!(err, LlmError::Validation(_)), "prompt {:?}", prompt);
        }
    }

    #[tokio::test]
    async fn test_temperature_range() {
        let config = offline_config().await;
        let orch = Orchestrator::new(OrchestratorOptions::default(), &config)
            .await
            .unwrap();
        let err = orch
            .generate(&GenerationRequest::new("Hi").with_temperature(2.5))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Validation(_)));
        assert!(orch
            .generate(&GenerationRequest::new("Hi").with_temperature(2.0))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_auto_detect_without_ollama_uses_mock() {
        let config = offline_config().await;
        let orch = Orchestrator::new(OrchestratorOptions::default(), &config)
            .await
            .unwrap();
        assert!(orch.is_auto_detected());
        assert_eq!(
            orch.provider_info(),
            ProviderInfo {
                provider: "mock".into(),
                model: "auto".into()
            }
        );
    }

    #[tokio::test]
    async fn test_auto_detect_prefers_ollama() {
        let base = spawn_stub(healthy_ollama()).await;
        let config = Config::default().with_ollama_url(base);
        let orch = Orchestrator::new(OrchestratorOptions::default(), &config)
            .await
            .unwrap();
        assert_eq!(orch.provider_info().provider, "ollama");
        let response = orch.generate(&GenerationRequest::new("Hello")).await.unwrap();
        assert_eq!(response.content, "hi there");
        assert!(response.fallback.is_none());
    }

    #[tokio::test]
    async fn test_auto_detect_falls_back_on_call_failure() {
        let base = spawn_stub(flaky_ollama()).await;
        let config = Config::default().with_ollama_url(base);
        let orch = Orchestrator::new(OrchestratorOptions::default(), &config)
            .await
            .unwrap();
        assert_eq!(orch.provider_info().provider, "ollama");

        let response = orch.generate(&GenerationRequest::new("Hello")).await.unwrap();
        assert_eq!(response.provider, "mock");
        assert_eq!(response.fallback, Some(true));
        assert_eq!(response.content, "Mock response to: Hello...");
    }

    #[tokio::test]
    async fn test_explicit_unreachable_ollama_fails_construction() {
        let config = offline_config().await;
        let result = Orchestrator::new(OrchestratorOptions::provider("ollama"), &config).await;
        assert!(matches!(result, Err(LlmError::ProviderUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_explicit_ollama_never_downgraded() {
        let base = spawn_stub(flaky_ollama()).await;
        let config = Config::default().with_ollama_url(base);
        let orch = Orchestrator::new(OrchestratorOptions::provider("ollama"), &config)
            .await
            .unwrap();
        let err = orch.generate(&GenerationRequest::new("Hello")).await.unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_call_override_is_strict_and_local() {
        let config = offline_config().await;
        let orch = Orchestrator::new(OrchestratorOptions::default(), &config)
            .await
            .unwrap();

        let err = orch
            .generate(&GenerationRequest::new("Hello").with_provider("ollama"))
            .await
            .unwrap_err();
        assert!(err.is_unavailable());

        let err = orch
            .generate(&GenerationRequest::new("Hello").with_provider("bogus"))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Validation(_)));

        let response = orch
            .generate(&GenerationRequest::new("Hello").with_provider("mock"))
            .await
            .unwrap();
        assert!(response.fallback.is_none());
        assert_eq!(orch.provider_info().provider, "mock");
    }

    #[tokio::test]
    async fn test_override_failure_is_not_recovered_in_auto_mode() {
        let base = spawn_stub(flaky_ollama()).await;
        let config = Config::default().with_ollama_url(base);
        let orch = Orchestrator::new(OrchestratorOptions::default(), &config)
            .await
            .unwrap();
        let err = orch
            .generate(&GenerationRequest::new("Hello").with_provider("ollama"))
            .await
            .unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_unknown_provider_at_construction() {
        let config = offline_config().await;
        let result = Orchestrator::new(OrchestratorOptions::provider("gemini"), &config).await;
        assert!(matches!(result, Err(LlmError::Validation(_))));
    }

    #[tokio::test]
    async fn test_claude_is_never_auto_detected() {
        let mut config = offline_config().await;
        config.anthropic.api_key = Some("ak-test".to_string());
        let orch = Orchestrator::new(OrchestratorOptions::default(), &config)
            .await
            .unwrap();
        assert_eq!(orch.provider_info().provider, "mock");

        let orch = Orchestrator::new(OrchestratorOptions::provider("claude"), &config)
            .await
            .unwrap();
        assert!(!orch.is_auto_detected());
        assert_eq!(orch.provider_info().provider, "claude");
    }

    #[test]
    fn test_request_deserializes_from_api_body() {
        let request: GenerationRequest =
            serde_json::from_str(r#"{"prompt":"Hi","temperature":0.3}"#).unwrap();
        assert_eq!(request.prompt, "Hi");
        assert_eq!(request.temperature, Some(0.3));
        assert!(request.provider.is_none());
    }
}
