//! Scripted and echo backends
//!
//! Neither talks to a vendor. `ScriptedBackend` replays queued outcomes and
//! records every request it saw; `EchoBackend` answers with the prompt.

use crate::backend::{BackendOutcome, BackendRequest, ModelBackend};
use crate::error::{Error, Result};

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// A backend that returns queued outcomes, then a fallback.
pub struct ScriptedBackend {
    outcomes: Arc<Mutex<VecDeque<std::result::Result<BackendOutcome, String>>>>,
    fallback: BackendOutcome,
    requests: Arc<Mutex<Vec<BackendRequest>>>,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedBackend {
    /// Create a scripted backend with an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(VecDeque::new())),
            fallback: BackendOutcome::answer("mock response"),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Outcome returned once the queue is drained.
    #[must_use]
    pub fn with_fallback(mut self, outcome: BackendOutcome) -> Self {
        self.fallback = outcome;
        self
    }

    /// Add an outcome to the queue.
    pub fn push(&self, outcome: BackendOutcome) {
        self.outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Ok(outcome));
    }

    /// Queue a failing step.
    pub fn push_error(&self, message: impl Into<String>) {
        self.outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Err(message.into()));
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<BackendRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of steps taken.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait::async_trait]
impl ModelBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn step(&self, request: BackendRequest) -> Result<BackendOutcome> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        let next = self
            .outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match next {
            Some(Ok(outcome)) => Ok(outcome),
            Some(Err(message)) => Err(Error::Backend(message)),
            None => Ok(self.fallback.clone()),
        }
    }
}

/// A backend that answers with the effective prompt.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoBackend;

#[async_trait::async_trait]
impl ModelBackend for EchoBackend {
    fn name(&self) -> &str {
        "echo"
    }

    async fn step(&self, request: BackendRequest) -> Result<BackendOutcome> {
        Ok(BackendOutcome::answer(request.prompt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelConfig, ProviderKind, ThinkLevel};
    use crate::shared_state::SharedState;
    use crate::tools::ToolCall;

    fn request(prompt: &str) -> BackendRequest {
        BackendRequest {
            agent: "tester".to_string(),
            prompt: prompt.to_string(),
            transcript: Vec::new(),
            system_prompt: None,
            attachments: Vec::new(),
            model: ModelConfig::new(ProviderKind::OpenAi, "gpt-4o"),
            search: None,
            max_recursions: 10,
            think: ThinkLevel::Off,
            tools: Vec::new(),
            capabilities: Vec::new(),
            mcp_servers: Vec::new(),
            shared_state: SharedState::new(),
        }
    }

    #[tokio::test]
    async fn test_scripted_replays_then_falls_back() {
        let backend = ScriptedBackend::new();
        backend.push(BackendOutcome::calls(vec![ToolCall::new(
            "c1",
            "file_read",
            serde_json::json!({}),
        )]));
        backend.push_error("boom");

        assert!(matches!(
            backend.step(request("a")).await.unwrap(),
            BackendOutcome::ToolCalls { .. }
        ));
        assert!(matches!(
            backend.step(request("b")).await,
            Err(Error::Backend(ref m)) if m == "boom"
        ));
        assert_eq!(
            backend.step(request("c")).await.unwrap(),
            BackendOutcome::answer("mock response")
        );
        assert_eq!(backend.step_count(), 3);
        assert_eq!(backend.requests()[1].prompt, "b");
    }

    #[tokio::test]
    async fn test_echo_returns_prompt() {
        let outcome = EchoBackend.step(request("hello")).await.unwrap();
        assert_eq!(outcome, BackendOutcome::answer("hello"));
    }
}
