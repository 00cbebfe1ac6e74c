//! Runner input

use crate::agents::AgentConfig;
use baton_llm::SharedState;
use std::path::PathBuf;

/// Input for one [`AgentRunner::run`](super::AgentRunner::run) call
#[derive(Debug, Clone)]
pub struct AgentOptions {
    /// Agent to start with
    pub agent: AgentConfig,
    /// User prompt
    pub prompt: String,
    /// Files attached to the first prompt
    pub files: Vec<PathBuf>,
    /// Stored conversation to continue
    pub conversation: Option<String>,
    /// Blackboard owned by a parent caller; the runner creates and clears
    /// its own when this is `None`
    pub shared_state: Option<SharedState>,
}

impl AgentOptions {
    /// Create options for a single prompt
    #[must_use]
    pub fn new(agent: AgentConfig, prompt: impl Into<String>) -> Self {
        Self {
            agent,
            prompt: prompt.into(),
            files: Vec::new(),
            conversation: None,
            shared_state: None,
        }
    }

    /// Attach files
    #[must_use]
    pub fn with_files(mut self, files: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.files.extend(files.into_iter().map(Into::into));
        self
    }

    /// Continue a stored conversation
    #[must_use]
    pub fn with_conversation(mut self, name: impl Into<String>) -> Self {
        self.conversation = Some(name.into());
        self
    }

    /// Use a caller-owned blackboard
    #[must_use]
    pub fn with_shared_state(mut self, state: SharedState) -> Self {
        self.shared_state = Some(state);
        self
    }
}
