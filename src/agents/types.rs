//! Core types for the agent system.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm::LlmError;

/// Configuration for an agent. Fixed for the agent's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Prepended to every task prompt when non-empty
    #[serde(default)]
    pub system_prompt: String,

    /// Sampling temperature passed with every generation
    pub temperature: f64,

    /// Suggested iteration cap for runners driving this agent
    pub max_iterations: u64,

    /// Backend-specific generation parameters (`max_tokens` is recognized)
    #[serde(default)]
    pub extra_params: serde_json::Map<String, serde_json::Value>,
}

impl AgentConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            system_prompt: String::new(),
            temperature: 0.7,
            max_iterations: 10,
            extra_params: serde_json::Map::new(),
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra_params.insert(key.into(), value);
        self
    }

    /// Research and analysis preset.
    pub fn research() -> Self {
        Self {
            description: "Analyzes and researches topics in depth".to_string(),
            system_prompt: "You are a research specialist AI agent. Your role is to gather, \
                analyze, and synthesize information on given topics. Provide \
                comprehensive and well-structured responses backed by reasoning."
                .to_string(),
            max_iterations: 5,
            temperature: 0.5,
            ..Self::new("Research Agent")
        }
    }

    /// Software development preset.
    pub fn coding() -> Self {
        Self {
            description: "Assists with software development and coding tasks".to_string(),
            system_prompt: "You are a software development AI agent. Your role is to help with \
                coding tasks including writing, debugging, and explaining code. \
                Provide clear, well-documented, and efficient code solutions."
                .to_string(),
            max_iterations: 10,
            temperature: 0.3,
            ..Self::new("Coding Agent")
        }
    }

    /// Content creation preset.
    pub fn writing() -> Self {
        Self {
            description: "Creates and edits written content".to_string(),
            system_prompt: "You are a creative writing AI agent. Your role is to help with \
                content creation including articles, documentation, and creative \
                writing. Provide engaging, well-structured, and polished content."
                .to_string(),
            max_iterations: 8,
            temperature: 0.8,
            ..Self::new("Writing Agent")
        }
    }

    /// Code review preset.
    pub fn code_review() -> Self {
        Self {
            description: "Automated code review and analysis".to_string(),
            system_prompt: "You are an expert code reviewer. Analyze code changes and provide \
                constructive feedback. Focus on:\n\
                - Code quality and best practices\n\
                - Potential bugs or issues\n\
                - Security concerns\n\
                - Performance implications\n\
                - Maintainability and readability\n\
                - Test coverage\n\
                Provide specific, actionable feedback."
                .to_string(),
            temperature: 0.3,
            ..Self::new("code_review")
        }
    }
}

/// Error from an agent executing a task.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Error executing task: {0}")]
    Generation(#[from] LlmError),

    #[error("{0}")]
    Other(String),
}

/// Role of a recorded conversation turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One recorded turn of an agent's conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

/// Point-in-time view of an agent.
#[derive(Debug, Clone, Serialize)]
pub struct AgentStatus {
    pub name: String,
    pub provider: String,
    pub conversation_length: usize,
    pub max_iterations: u64,
    pub temperature: f64,
}
