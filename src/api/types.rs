//! API request and response types.

use serde::Serialize;

pub use crate::llm::GenerationResponse;
pub use crate::orchestrator::{GenerationRequest, ProviderInfo};

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Root banner.
#[derive(Debug, Clone, Serialize)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
    pub status: String,
}

/// Error body returned with every non-2xx response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Short machine-readable category ("validation_error", "provider_unavailable", "internal_error")
    pub error: String,
    /// Human-readable explanation
    pub detail: String,
}
