//! Provider selection: the closed set of backends and how they are built.

use async_trait::async_trait;
use std::str::FromStr;

use super::{
    ClaudeProvider, GenerationOptions, GenerationResponse, LlmError, MockProvider,
    OllamaProvider, OpenAiCompatibleProvider, Provider,
};
use crate::config::Config;

/// Backend kinds that can be requested by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Mock,
    Ollama,
    OpenAi,
    Claude,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mock => MockProvider::NAME,
            Self::Ollama => OllamaProvider::NAME,
            Self::OpenAi => OpenAiCompatibleProvider::NAME,
            Self::Claude => ClaudeProvider::NAME,
        }
    }

    /// Remote kinds must pass their liveness probe when requested explicitly.
    pub fn is_remote(&self) -> bool {
        !matches!(self, Self::Mock)
    }
}

impl FromStr for ProviderKind {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAi),
            "claude" => Ok(Self::Claude),
            other => Err(LlmError::validation(format!("Unknown provider: {}", other))),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One constructed provider of any kind.
pub enum AnyProvider {
    Mock(MockProvider),
    Ollama(OllamaProvider),
    OpenAi(OpenAiCompatibleProvider),
    Claude(ClaudeProvider),
}

impl AnyProvider {
    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::Mock(_) => ProviderKind::Mock,
            Self::Ollama(_) => ProviderKind::Ollama,
            Self::OpenAi(_) => ProviderKind::OpenAi,
            Self::Claude(_) => ProviderKind::Claude,
        }
    }

    fn inner(&self) -> &dyn Provider {
        match self {
            Self::Mock(p) => p,
            Self::Ollama(p) => p,
            Self::OpenAi(p) => p,
            Self::Claude(p) => p,
        }
    }
}

#[async_trait]
impl Provider for AnyProvider {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn model(&self) -> &str {
        self.inner().model()
    }

    async fn is_available(&self) -> bool {
        self.inner().is_available().await
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GenerationResponse, LlmError> {
        self.inner().generate(prompt, options).await
    }
}

/// Builds providers from configuration.
#[derive(Debug, Clone)]
pub struct ProviderFactory {
    config: Config,
}

impl ProviderFactory {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Construct a provider without probing it.
    pub fn build(&self, kind: ProviderKind, model: Option<String>) -> AnyProvider {
        match kind {
            ProviderKind::Mock => AnyProvider::Mock(MockProvider::new(model)),
            ProviderKind::Ollama => {
                AnyProvider::Ollama(OllamaProvider::new(&self.config.ollama, model))
            }
            ProviderKind::OpenAi => {
                AnyProvider::OpenAi(OpenAiCompatibleProvider::new(&self.config.openai, model))
            }
            ProviderKind::Claude => {
                AnyProvider::Claude(ClaudeProvider::new(&self.config.anthropic, model))
            }
        }
    }

    /// Construct an explicitly requested provider.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::ProviderUnavailable` if a remote provider fails its probe.
    pub async fn build_strict(
        &self,
        kind: ProviderKind,
        model: Option<String>,
    ) -> Result<AnyProvider, LlmError> {
        let provider = self.build(kind, model);
        if !kind.is_remote() || provider.is_available().await {
            return Ok(provider);
        }
        let message = match kind {
            ProviderKind::Claude => {
                "claude provider explicitly requested but not configured. Please set ANTHROPIC_API_KEY"
                    .to_string()
            }
            _ => format!(
                "{} provider explicitly requested but not available. Please ensure it is running at {}",
                kind,
                self.endpoint(kind)
            ),
        };
        Err(LlmError::unavailable(message))
    }

    fn endpoint(&self, kind: ProviderKind) -> &str {
        match kind {
            ProviderKind::Mock => "(in-process)",
            ProviderKind::Ollama => &self.config.ollama.base_url,
            ProviderKind::OpenAi => &self.config.openai.base_url,
            ProviderKind::Claude => &self.config.anthropic.base_url,
        }
    }
}
