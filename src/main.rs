//! llm-server - HTTP Server Entry Point
//!
//! Starts the HTTP server that exposes the orchestrator API.

use llm_orchestrator::{api, config::Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "llm_orchestrator=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Loaded configuration: provider={} ollama={}",
        config.provider.as_deref().unwrap_or("(auto-detect)"),
        config.ollama.base_url
    );

    api::serve(config).await?;

    Ok(())
}
