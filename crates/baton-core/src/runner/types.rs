//! Runner output and resolved context

use baton_llm::{ModelConfig, SearchEngineConfig, Turn};
use serde::Serialize;

/// Result of a completed run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutcome {
    /// Final answer text
    pub text: String,
    /// Agent that produced the answer
    pub agent: String,
    /// Model steps taken across all agents
    pub turns: usize,
    /// Full conversation, as persisted
    pub transcript: Vec<Turn>,
}

/// Everything an agent's references resolve to
#[derive(Debug, Clone)]
pub(crate) struct ResolvedAgent {
    pub(crate) model: ModelConfig,
    pub(crate) search: Option<SearchEngineConfig>,
    pub(crate) system_prompt: Option<String>,
    pub(crate) template: Option<String>,
}
