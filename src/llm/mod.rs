//! Provider contract for text generation backends.
//!
//! Every backend implements [`Provider`]: an in-process deterministic
//! provider for offline use and HTTP providers for Ollama, Claude and
//! OpenAI-compatible servers. Selection goes through [`AnyProvider`] so the
//! orchestrator dispatches on a closed set of variants.

mod claude;
mod error;
mod mock;
mod ollama;
mod openai;
mod registry;

pub use claude::ClaudeProvider;
pub use error::{classify_http_status, LlmError, LlmErrorKind};
pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiCompatibleProvider;
pub use registry::{AnyProvider, ProviderFactory, ProviderKind};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Sampling and routing options for a single generation call.
#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    /// Sampling temperature (0 = deterministic).
    pub temperature: Option<f64>,
    /// Maximum output tokens to generate.
    pub max_tokens: Option<u32>,
    /// Model to use for this call instead of the provider's configured one.
    pub model: Option<String>,
    /// Backend-specific parameters passed through untouched.
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl GenerationOptions {
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Normalized result of a generation call, whichever provider served it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationResponse {
    pub provider: String,
    pub model: String,
    pub content: String,
    /// The prompt the provider was given, echoed back
    pub prompt: String,
    /// Set only when the offline provider stood in for a failed auto-detected one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<bool>,
}

/// Trait for generation backends.
///
/// Implementations must be safe to call concurrently.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider identifier as reported in responses (e.g. "mock", "ollama").
    fn name(&self) -> &str;

    /// Model used when a call does not override it.
    fn model(&self) -> &str;

    /// Cheap liveness probe. Never performs a generation.
    async fn is_available(&self) -> bool;

    /// Generate a completion for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::ProviderUnavailable` when the backend cannot be reached
    /// or answers with a non-success status.
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GenerationResponse, LlmError>;
}
