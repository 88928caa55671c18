//! # LLM Orchestrator
//!
//! Provider-agnostic text generation with an offline fallback.
//!
//! This library provides:
//! - A [`Provider`](llm::Provider) contract with mock, Ollama, Claude and
//!   OpenAI-compatible backends
//! - An [`Orchestrator`] that picks a provider (explicitly or by probing)
//!   and degrades to the mock provider when an auto-detected one fails
//! - Agents binding a prompt policy to the orchestrator, and a
//!   [`ContinuousTaskRunner`] that drives an agent over a task queue
//! - An HTTP API and a command line front end
//!
//! ## Request Flow
//! 1. Validate the prompt and sampling options
//! 2. Resolve the provider (per-call override or the one chosen at startup)
//! 3. Generate, falling back to mock only in auto-detect mode
//! 4. Return the normalized response
//!
//! ## Modules
//! - `llm`: provider contract, backends and error types
//! - `orchestrator`: provider selection and fallback
//! - `blocking`: synchronous façade over the orchestrator
//! - `agents`: prompt-policy agents
//! - `runner`: background task runner
//! - `api`: HTTP routes

pub mod agents;
pub mod api;
pub mod blocking;
pub mod config;
pub mod llm;
pub mod orchestrator;
pub mod runner;

#[cfg(test)]
mod test_support;

pub use blocking::BlockingOrchestrator;
pub use config::Config;
pub use orchestrator::{GenerationRequest, Orchestrator, OrchestratorOptions};
pub use runner::{ContinuousTaskRunner, RunnerConfig};
