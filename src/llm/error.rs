//! LLM error types with HTTP classification.
//!
//! Three kinds of failure surface from the orchestrator: bad caller input,
//! an unreachable provider, and everything else.

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error from provider selection or generation.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Bad caller input (empty prompt, temperature out of range, unknown provider).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Liveness probe failed or the transport call errored.
    #[error("Provider unavailable: {message}")]
    ProviderUnavailable {
        message: String,
        /// Upstream HTTP status, if the provider answered at all
        status_code: Option<u16>,
        #[source]
        source: Option<BoxError>,
    },

    /// Anything else (malformed upstream payload, runtime setup failure).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LlmError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a provider-unavailable error without an underlying cause.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::ProviderUnavailable {
            message: message.into(),
            status_code: None,
            source: None,
        }
    }

    /// Create a provider-unavailable error, keeping the original error in the chain.
    pub fn unavailable_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ProviderUnavailable {
            message: message.into(),
            status_code: None,
            source: Some(Box::new(source)),
        }
    }

    /// Create an error from a non-success upstream HTTP status.
    pub fn http_status(provider: &str, status: u16, body: &str) -> Self {
        let kind = classify_http_status(status);
        Self::ProviderUnavailable {
            message: format!("{} request failed: {} (HTTP {}): {}", provider, kind, status, body),
            status_code: Some(status),
            source: None,
        }
    }

    /// Check whether the orchestrator may recover from this error by falling back.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::ProviderUnavailable { .. })
    }

    /// HTTP status to report to API clients.
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::ProviderUnavailable { .. } => 503,
            Self::Internal(_) => 500,
        }
    }
}

/// Classification of upstream HTTP failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// Rate limited (429)
    RateLimited,
    /// Server error (5xx)
    ServerError,
    /// Client error (4xx other than 429)
    ClientError,
}

impl std::fmt::Display for LlmErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmErrorKind::RateLimited => write!(f, "Rate limited"),
            LlmErrorKind::ServerError => write!(f, "Server error"),
            LlmErrorKind::ClientError => write!(f, "Client error"),
        }
    }
}

/// Parse HTTP status code into error kind.
pub fn classify_http_status(status: u16) -> LlmErrorKind {
    match status {
        429 => LlmErrorKind::RateLimited,
        400..=499 => LlmErrorKind::ClientError,
        _ => LlmErrorKind::ServerError,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_http_status_classification() {
        assert_eq!(classify_http_status(429), LlmErrorKind::RateLimited);
        assert_eq!(classify_http_status(500), LlmErrorKind::ServerError);
        assert_eq!(classify_http_status(503), LlmErrorKind::ServerError);
        assert_eq!(classify_http_status(404), LlmErrorKind::ClientError);
    }

    #[test]
    fn test_api_status_mapping() {
        assert_eq!(LlmError::validation("empty").http_status_code(), 400);
        assert_eq!(LlmError::unavailable("down").http_status_code(), 503);
        assert_eq!(LlmError::Internal("boom".into()).http_status_code(), 500);
    }

    #[test]
    fn test_source_is_preserved() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = LlmError::unavailable_with_source("Ollama request failed", io);
        assert!(err.is_unavailable());
        assert_eq!(err.source().unwrap().to_string(), "refused");
    }

    #[test]
    fn test_http_status_error_carries_code() {
        let err = LlmError::http_status("Ollama", 502, "bad gateway");
        match err {
            LlmError::ProviderUnavailable { status_code, ref message, .. } => {
                assert_eq!(status_code, Some(502));
                assert!(message.contains("Server error"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
