//! Orchestrator-backed agent.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Agent, AgentConfig, AgentError, AgentStatus, ChatTurn, Role};
use crate::orchestrator::{GenerationRequest, Orchestrator};

/// Agent that answers tasks by prompting the orchestrator.
///
/// # Prompt layout
/// `System: <system prompt>`, `Context: <context>` and `Task: <task>`
/// sections joined by blank lines; empty sections are left out.
pub struct LlmAgent {
    config: AgentConfig,
    orchestrator: Arc<Orchestrator>,
    conversation: RwLock<Vec<ChatTurn>>,
}

impl LlmAgent {
    pub fn new(config: AgentConfig, orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            config,
            orchestrator,
            conversation: RwLock::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Full prompt sent for `task`.
    pub fn build_prompt(&self, task: &str, context: Option<&serde_json::Value>) -> String {
        let mut parts = Vec::with_capacity(3);
        if !self.config.system_prompt.is_empty() {
            parts.push(format!("System: {}", self.config.system_prompt));
        }
        if let Some(context) = context.filter(|c| !c.is_null()) {
            parts.push(format!("Context: {}", context));
        }
        parts.push(format!("Task: {}", task));
        parts.join("\n\n")
    }

    fn request_for(&self, prompt: String) -> GenerationRequest {
        let mut options = self.config.extra_params.clone();
        let max_tokens = options
            .remove("max_tokens")
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok());
        GenerationRequest {
            prompt,
            temperature: Some(self.config.temperature),
            max_tokens,
            options,
            ..GenerationRequest::default()
        }
    }

    /// Execute a task with extra context rendered into the prompt.
    pub async fn execute_with_context(
        &self,
        task: &str,
        context: Option<&serde_json::Value>,
    ) -> Result<String, AgentError> {
        let request = self.request_for(self.build_prompt(task, context));
        let response = self.orchestrator.generate(&request).await?;

        let mut conversation = self.conversation.write().await;
        conversation.push(ChatTurn {
            role: Role::User,
            content: task.to_string(),
        });
        conversation.push(ChatTurn {
            role: Role::Assistant,
            content: response.content.clone(),
        });

        Ok(response.content)
    }

    pub async fn conversation(&self) -> Vec<ChatTurn> {
        self.conversation.read().await.clone()
    }

    pub async fn reset_conversation(&self) {
        self.conversation.write().await.clear();
    }

    pub async fn status(&self) -> AgentStatus {
        AgentStatus {
            name: self.config.name.clone(),
            provider: self.orchestrator.provider_info().provider,
            conversation_length: self.conversation.read().await.len(),
            max_iterations: self.config.max_iterations,
            temperature: self.config.temperature,
        }
    }
}

#[async_trait]
impl Agent for LlmAgent {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn execute(&self, task: &str) -> Result<String, AgentError> {
        self.execute_with_context(task, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::orchestrator::OrchestratorOptions;

    async fn mock_orchestrator() -> Arc<Orchestrator> {
        Arc::new(
            Orchestrator::new(OrchestratorOptions::provider("mock"), &Config::default())
                .await
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_prompt_layout() {
        let agent = LlmAgent::new(
            AgentConfig::new("Test").with_system_prompt("Be brief."),
            mock_orchestrator().await,
        );
        let context = serde_json::json!({ "repo": "demo" });
        assert_eq!(
            agent.build_prompt("Summarize", Some(&context)),
            "System: Be brief.\n\nContext: {\"repo\":\"demo\"}\n\nTask: Summarize"
        );

        let bare = LlmAgent::new(AgentConfig::new("Bare"), mock_orchestrator().await);
        assert_eq!(bare.build_prompt("Summarize", None), "Task: Summarize");
    }

    #[tokio::test]
    async fn test_execute_records_conversation() {
        let agent = LlmAgent::new(AgentConfig::new("Test"), mock_orchestrator().await);
        let result = agent.execute("Say hi").await.unwrap();
        assert_eq!(result, "Mock response to: Task: Say hi...");

        let conversation = agent.conversation().await;
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation[0].role, Role::User);
        assert_eq!(conversation[0].content, "Say hi");
        assert_eq!(conversation[1].content, result);

        let status = agent.status().await;
        assert_eq!(status.provider, "mock");
        assert_eq!(status.conversation_length, 2);

        agent.reset_conversation().await;
        assert!(agent.conversation().await.is_empty());
    }

    #[tokio::test]
    async fn test_extra_params_become_request_options() {
        let agent = LlmAgent::new(
            AgentConfig::coding()
                .with_param("max_tokens", serde_json::json!(150))
                .with_param("top_k", serde_json::json!(40)),
            mock_orchestrator().await,
        );
        let request = agent.request_for("p".to_string());
        assert_eq!(request.temperature, Some(0.3));
        assert_eq!(request.max_tokens, Some(150));
        assert!(!request.options.contains_key("max_tokens"));
        assert_eq!(request.options["top_k"], serde_json::json!(40));
    }

    #[tokio::test]
    async fn test_generation_errors_surface() {
        let agent = LlmAgent::new(
            AgentConfig::new("Hot").with_temperature(3.0),
            mock_orchestrator().await,
        );
        let err = agent.execute("anything").await.unwrap_err();
        assert!(matches!(err, AgentError::Generation(_)));
    }

    #[test]
    fn test_presets() {
        assert_eq!(AgentConfig::research().temperature, 0.5);
        assert_eq!(AgentConfig::writing().max_iterations, 8);
        assert!(AgentConfig::code_review()
            .system_prompt
            .contains("- Security concerns\n"));
    }
}
