//! Baton Core - Agent Runner and Orchestration
//!
//! This crate drives agents against a [`baton_llm::ModelBackend`]:
//! - Agents: named agent definitions and their recursion budgets
//! - Config: the persisted configuration and the `ConfigStore` seam
//! - Runner: the bounded turn loop with tool dispatch and hand-offs
//! - References: `@template:`, `@system:`, `@convo:` and path expansion
//! - Conversation: provider-specific persistence, detection and conversion
//! - Workflow: linear master/worker pipelines over files

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod agents;
pub mod config;
pub mod conversation;
pub mod error;
pub mod references;
pub mod runner;
pub mod workflow;

pub use agents::{AgentConfig, UNLIMITED_RECURSIONS};
pub use baton_llm::SharedState;
pub use config::{AppConfig, ConfigStore, FileConfigStore, RunnerSettings};
pub use conversation::{ConversationEntry, ConversationStore};
pub use error::{format_error_for_cli, Error, Result, UserFriendlyError};
pub use references::ReferenceResolver;
pub use runner::{AgentOptions, AgentRunner, RunOutcome};
pub use workflow::{WorkflowAgent, WorkflowOrchestrator, WorkflowReport, WorkflowRole};
