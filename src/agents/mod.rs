//! Agents module - task execution on top of the orchestrator.
//!
//! An agent binds a fixed prompt policy ([`AgentConfig`]) to an
//! [`Orchestrator`](crate::orchestrator::Orchestrator). The
//! [`ContinuousTaskRunner`](crate::runner::ContinuousTaskRunner) drives any
//! [`Agent`] through an [`AgentRef`].

mod llm_agent;
mod types;

pub use llm_agent::LlmAgent;
pub use types::{AgentConfig, AgentError, AgentStatus, ChatTurn, Role};

use async_trait::async_trait;
use std::sync::Arc;

/// Base trait for all agents.
///
/// # Invariants
/// - `execute()` never panics; all errors are returned as `Err`
#[async_trait]
pub trait Agent: Send + Sync {
    /// Human-readable agent name.
    fn name(&self) -> &str;

    /// Execute a task and return its textual result.
    async fn execute(&self, task: &str) -> Result<String, AgentError>;
}

/// Shared handle to an agent.
pub type AgentRef = Arc<dyn Agent>;
