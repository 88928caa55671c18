//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::llm::LlmError;
use crate::orchestrator::{Orchestrator, OrchestratorOptions};

use super::types::*;

/// Shared application state.
pub struct AppState {
    /// Orchestrator built once at server startup
    pub orchestrator: Arc<Orchestrator>,
}

/// Orchestrator failure rendered as a JSON error body.
struct ApiError(LlmError);

impl From<LlmError> for ApiError {
    fn from(e: LlmError) -> Self {
        Self(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(LlmError::validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let (error, detail) = match &self.0 {
            LlmError::Validation(msg) => ("validation_error", msg.clone()),
            LlmError::ProviderUnavailable { message, .. } => ("provider_unavailable", message.clone()),
            LlmError::Internal(msg) => ("internal_error", format!("Internal error: {}", msg)),
        };
        if status.is_server_error() {
            tracing::warn!("Request failed with {}: {}", status, detail);
        }
        (
            status,
            Json(ErrorResponse {
                error: error.to_string(),
                detail,
            }),
        )
            .into_response()
    }
}

/// Build the router over an existing state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/provider", get(provider_info))
        .route("/generate", post(generate))
        .route("/chat", post(generate))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::new(
        OrchestratorOptions {
            provider: config.provider.clone(),
            model: config.model.clone(),
        },
        &config,
    )
    .await?;
    let info = orchestrator.provider_info();
    tracing::info!("Orchestrator ready: provider={} model={}", info.provider, info.model);

    let state = Arc::new(AppState {
        orchestrator: Arc::new(orchestrator),
    });
    let app = router(Arc::clone(&state));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    drop(state);
    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for SIGTERM/SIGINT.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "LLM Multi-Provider API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "running".to_string(),
    })
}

/// Health check endpoint.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn provider_info(State(state): State<Arc<AppState>>) -> Json<ProviderInfo> {
    Json(state.orchestrator.provider_info())
}

/// Generate a completion (`/generate` and `/chat`).
async fn generate(
    State(state): State<Arc<AppState>>,
    body: Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<Json<GenerationResponse>, ApiError> {
    let Json(request) = body?;
    let response = state.orchestrator.generate(&request).await?;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::unreachable_url;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    async fn app(provider: Option<&str>) -> Router {
        let config = Config::default().with_ollama_url(unreachable_url().await);
        let orchestrator = Orchestrator::new(
            OrchestratorOptions {
                provider: provider.map(str::to_string),
                model: None,
            },
            &config,
        )
        .await
        .unwrap();
        router(Arc::new(AppState {
            orchestrator: Arc::new(orchestrator),
        }))
    }

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_and_provider() {
        let (status, body) = call(app(None).await, Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "status": "ok" }));

        let (status, body) = call(app(None).await, Request::get("/provider").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "provider": "mock", "model": "auto" }));
    }

    #[tokio::test]
    async fn test_generate_and_chat() {
        for uri in ["/generate", "/chat"] {
            let (status, body) = call(
                app(Some("mock")).await,
                post_json(uri, serde_json::json!({ "prompt": "Hello", "temperature": 0.5 })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["content"], "Mock response to: Hello...");
            assert_eq!(body["prompt"], "Hello");
            assert!(body.get("fallback").is_none());
        }
    }

    #[tokio::test]
    async fn test_validation_maps_to_400() {
        let (status, body) = call(
            app(None).await,
            post_json("/generate", serde_json::json!({ "prompt": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");

        let (status, _) = call(
            app(None).await,
            post_json("/generate", serde_json::json!({ "prompt": "Hi", "temperature": 7 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            app(None).await,
            post_json("/generate", serde_json::json!({ "provider": "mock" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unavailable_override_maps_to_503() {
        let (status, body) = call(
            app(None).await,
            post_json(
                "/generate",
                serde_json::json!({ "prompt": "Hi", "provider": "ollama" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "provider_unavailable");
    }
}
