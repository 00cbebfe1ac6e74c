//! Runner main loop
//!
//! One explicit loop per run. A hand-off swaps the active agent in place, so
//! the stack stays flat however many times agents pass the baton.

use crate::conversation::is_compatible;
use crate::error::{Error, Result};
use baton_llm::{
    Attachment, BackendOutcome, BackendRequest, MessageRole, Part, SharedState, Turn,
};
use tracing::{debug, info, warn};

use super::config::AgentOptions;
use super::core::AgentRunner;
use super::types::RunOutcome;

impl AgentRunner {
    /// Run an agent until it answers, hands off with an empty instruction,
    /// exhausts its budget, or the run is cancelled
    ///
    /// A blackboard created here is cleared before returning; one passed in
    /// through [`AgentOptions::shared_state`] is left to its owner.
    pub async fn run(&self, options: AgentOptions) -> Result<RunOutcome> {
        let owns_state = options.shared_state.is_none();
        let shared_state = options.shared_state.clone().unwrap_or_default();

        let result = self.run_loop(options, shared_state.clone()).await;

        if owns_state {
            shared_state.clear();
        }
        result
    }

    async fn run_loop(&self, options: AgentOptions, shared_state: SharedState) -> Result<RunOutcome> {
        let AgentOptions {
            mut agent,
            prompt,
            mut files,
            conversation,
            ..
        } = options;
        let conversation = conversation.as_deref();
        let resolver = self.reference_resolver();

        let mut transcript: Vec<Turn> = Vec::new();
        let mut pending_prompt = Some(prompt);
        let mut current_prompt = String::new();
        let mut attachments: Vec<Attachment> = Vec::new();
        let mut provider = None;
        let mut tool_rounds: i32 = 0;
        let mut steps = 0usize;

        info!(agent = %agent.name, backend = %self.backend.name(), "Starting run");

        loop {
            if self.cancel.is_cancelled() {
                info!(agent = %agent.name, "Run cancelled");
                return Err(Error::Cancelled);
            }

            let resolved = self.resolve_agent(&agent).await?;
            let model_provider = resolved.model.provider;

            match provider {
                None => {
                    transcript = self.prepare_conversation(conversation, model_provider)?;
                    debug!(agent = %agent.name, turns = transcript.len(), "Conversation prepared");
                }
                Some(previous) if previous != model_provider => {
                    if !is_compatible(previous, model_provider) {
                        let notice = Error::FormatIncompatible {
                            detected: previous,
                            expected: model_provider,
                        };
                        debug!(agent = %agent.name, error = %notice, "Re-encoding conversation for new provider");
                    }
                    self.persist(conversation, model_provider, &transcript)?;
                }
                Some(_) => {}
            }
            provider = Some(model_provider);

            if let Some(prompt) = pending_prompt.take() {
                let mut effective = String::new();
                if let Some(template) = &resolved.template {
                    effective.push_str(template);
                    effective.push_str("\n\n");
                }
                effective.push_str(&resolver.process_text(&prompt).await);

                attachments = self.load_attachments(&files).await;
                transcript.push(Turn::user(effective.clone()));
                current_prompt = effective;
            }

            let request = BackendRequest {
                agent: agent.name.clone(),
                prompt: current_prompt.clone(),
                transcript: transcript.clone(),
                system_prompt: resolved.system_prompt.clone(),
                attachments: attachments.clone(),
                model: resolved.model.clone(),
                search: resolved.search.clone(),
                max_recursions: agent.max_recursions,
                think: agent.think,
                tools: self.tool_definitions(&agent).await,
                capabilities: agent.capabilities.iter().copied().collect(),
                mcp_servers: self.mcp_servers(&agent).await,
                shared_state: shared_state.clone(),
            };

            let outcome = tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!(agent = %agent.name, "Run cancelled during model step");
                    return Err(Error::Cancelled);
                }
                outcome = self.backend.step(request) => outcome?,
            };
            steps += 1;

            match outcome {
                BackendOutcome::FinalAnswer { text, thinking } => {
                    let mut parts = Vec::with_capacity(2);
                    if let Some(thinking) = thinking.filter(|t| !t.is_empty()) {
                        parts.push(Part::Thinking { text: thinking });
                    }
                    parts.push(Part::text(text.clone()));
                    transcript.push(Turn::new(MessageRole::Assistant, parts));
                    self.persist(conversation, model_provider, &transcript)?;

                    info!(agent = %agent.name, steps, "Run finished");
                    return Ok(RunOutcome {
                        text,
                        agent: agent.name,
                        turns: steps,
                        transcript,
                    });
                }

                BackendOutcome::ToolCalls { text, calls } => {
                    debug!(agent = %agent.name, calls = calls.len(), "Model requested tools");
                    transcript.push(Turn::assistant_with_calls(text, calls.clone()));
                    let results = self
                        .execute_tool_calls(&agent, &calls, &shared_state)
                        .await;
                    transcript.push(Turn::tool_results(results));
                    self.persist(conversation, model_provider, &transcript)?;

                    tool_rounds += 1;
                    if !agent.is_unlimited() && tool_rounds > agent.max_recursions {
                        warn!(
                            agent = %agent.name,
                            limit = agent.max_recursions,
                            "Recursion budget exceeded"
                        );
                        return Err(Error::RecursionBudgetExceeded {
                            agent: agent.name,
                            limit: agent.max_recursions,
                            transcript,
                        });
                    }
                }

                BackendOutcome::SwitchAgent(signal) => {
                    if signal.instruction.trim().is_empty() {
                        info!(agent = %agent.name, target = %signal.target, "Hand-off without instruction ends the run");
                        self.persist(conversation, model_provider, &transcript)?;
                        return Ok(RunOutcome {
                            text: last_assistant_text(&transcript),
                            agent: agent.name,
                            turns: steps,
                            transcript,
                        });
                    }

                    let target = self
                        .config
                        .get_agent(&signal.target)
                        .await?
                        .ok_or_else(|| {
                            Error::Configuration(format!(
                                "hand-off target agent '{}' not found",
                                signal.target
                            ))
                        })?;

                    info!(from = %agent.name, to = %target.name, "Handing off");
                    agent = target;
                    pending_prompt = Some(signal.instruction);
                    files.clear();
                    attachments.clear();
                    tool_rounds = 0;
                }
            }
        }
    }
}

fn last_assistant_text(transcript: &[Turn]) -> String {
    transcript
        .iter()
        .rev()
        .filter(|t| t.role == MessageRole::Assistant)
        .map(Turn::text)
        .find(|t| !t.is_empty())
        .unwrap_or_default()
}
