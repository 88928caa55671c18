//! Synchronous façade over [`Orchestrator`].
//!
//! Drives the same async code path on a private current-thread runtime, so
//! results are identical to the async API. Must not be used from inside an
//! async runtime.

use tokio::runtime::{Builder, Runtime};

use crate::config::Config;
use crate::llm::{GenerationResponse, LlmError};
use crate::orchestrator::{GenerationRequest, Orchestrator, OrchestratorOptions, ProviderInfo};

pub struct BlockingOrchestrator {
    runtime: Runtime,
    inner: Orchestrator,
}

impl BlockingOrchestrator {
    /// See [`Orchestrator::new`].
    pub fn new(options: OrchestratorOptions, config: &Config) -> Result<Self, LlmError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| LlmError::Internal(format!("Failed to start runtime: {}", e)))?;
        let inner = runtime.block_on(Orchestrator::new(options, config))?;
        Ok(Self { runtime, inner })
    }

    /// See [`Orchestrator::generate`].
    pub fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, LlmError> {
        self.runtime.block_on(self.inner.generate(request))
    }

    pub fn provider_info(&self) -> ProviderInfo {
        self.inner.provider_info()
    }

    /// Borrow the async orchestrator.
    pub fn as_async(&self) -> &Orchestrator {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_config() -> Config {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        Config::default().with_ollama_url(format!("http://{}", addr))
    }

    #[test]
    fn test_blocking_matches_async() {
        let config = offline_config();
        let orch = BlockingOrchestrator::new(OrchestratorOptions::provider("mock"), &config).unwrap();
        let request = GenerationRequest::new("Determinism check");

        let sync_response = orch.generate(&request).unwrap();
        let async_response = tokio_test::block_on(orch.as_async().generate(&request)).unwrap();
        assert_eq!(sync_response, async_response);
        assert_eq!(sync_response.content, "Mock response to: Determinism check...");
    }

    #[test]
    fn test_blocking_validation_and_strictness() {
        let config = offline_config();
        let orch = BlockingOrchestrator::new(OrchestratorOptions::default(), &config).unwrap();
        assert_eq!(orch.provider_info().provider, "mock");
        assert!(matches!(
            orch.generate(&GenerationRequest::new("  ")),
            Err(LlmError::Validation(_))
        ));

        let strict = BlockingOrchestrator::new(OrchestratorOptions::provider("ollama"), &config);
        assert!(matches!(strict, Err(LlmError::ProviderUnavailable { .. })));
    }
}
