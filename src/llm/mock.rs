//! Deterministic offline provider.

use async_trait::async_trait;

use super::{GenerationOptions, GenerationResponse, LlmError, Provider};

/// Number of prompt characters echoed back in the mock content.
const EXCERPT_CHARS: usize = 50;

/// Provider that answers without any network access.
///
/// The content is a pure function of the prompt, so tests can assert on it.
#[derive(Debug, Clone)]
pub struct MockProvider {
    model: String,
}

impl MockProvider {
    pub const NAME: &'static str = "mock";
    pub const DEFAULT_MODEL: &'static str = "mock";

    pub fn new(model: Option<String>) -> Self {
        Self {
            model: model.unwrap_or_else(|| Self::DEFAULT_MODEL.to_string()),
        }
    }

    /// Content returned for `prompt`.
    pub fn render(prompt: &str) -> String {
        let excerpt: String = prompt.chars().take(EXCERPT_CHARS).collect();
        format!("Mock response to: {}...", excerpt)
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GenerationResponse, LlmError> {
        Ok(GenerationResponse {
            provider: Self::NAME.to_string(),
            model: options.model.clone().unwrap_or_else(|| self.model.clone()),
            content: Self::render(prompt),
            prompt: prompt.to_string(),
            fallback: None,
        })
    }
}
