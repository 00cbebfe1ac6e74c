//! Runner core structure
//!
//! Contains the `AgentRunner` struct, its builder methods and the lookups
//! shared by the loop.

use crate::agents::AgentConfig;
use crate::config::{ConfigStore, RunnerSettings};
use crate::conversation::ConversationStore;
use crate::error::{Error, Result};
use crate::references::ReferenceResolver;
use baton_llm::{ModelBackend, ProviderKind, Turn};
use baton_tools::mcp::McpClient;
use baton_tools::ToolRegistry;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::types::ResolvedAgent;

/// Runs agents against a model backend
pub struct AgentRunner {
    pub(crate) backend: Arc<dyn ModelBackend>,
    pub(crate) config: Arc<dyn ConfigStore>,
    pub(crate) tools: Arc<ToolRegistry>,
    pub(crate) mcp: Option<Arc<McpClient>>,
    pub(crate) conversations: Option<ConversationStore>,
    pub(crate) settings: RunnerSettings,
    pub(crate) cancel: CancellationToken,
}

impl AgentRunner {
    /// Create a runner with no tools, no MCP client and no persistence
    #[must_use]
    pub fn new(backend: Arc<dyn ModelBackend>, config: Arc<dyn ConfigStore>) -> Self {
        Self {
            backend,
            config,
            tools: Arc::new(ToolRegistry::new()),
            mcp: None,
            conversations: None,
            settings: RunnerSettings::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Set the embedded tool registry
    #[must_use]
    pub fn with_tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = tools;
        self
    }

    /// Set the shared MCP client
    #[must_use]
    pub fn with_mcp(mut self, client: Arc<McpClient>) -> Self {
        self.mcp = Some(client);
        self
    }

    /// Persist conversations in `store`
    #[must_use]
    pub fn with_conversations(mut self, store: ConversationStore) -> Self {
        self.conversations = Some(store);
        self
    }

    /// Set attachment limits
    #[must_use]
    pub fn with_settings(mut self, settings: RunnerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Use an externally owned cancellation token
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that cancels runs on this runner
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Config store in use
    #[must_use]
    pub fn config_store(&self) -> &Arc<dyn ConfigStore> {
        &self.config
    }

    /// Name of the model backend
    #[must_use]
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub(crate) fn reference_resolver(&self) -> ReferenceResolver {
        let resolver = ReferenceResolver::new(Arc::clone(&self.config))
            .with_max_file_bytes(self.settings.max_attachment_bytes);
        match &self.conversations {
            Some(store) => resolver.with_conversations(store.clone()),
            None => resolver,
        }
    }

    /// Validate an agent and look up everything it references
    pub(crate) async fn resolve_agent(&self, agent: &AgentConfig) -> Result<ResolvedAgent> {
        agent.validate().map_err(|e| match e {
            Error::InvalidConfig { field, message } => {
                Error::Configuration(format!("{field}: {message}"))
            }
            other => other,
        })?;

        let model = self.config.get_model(&agent.model).await?.ok_or_else(|| {
            Error::Configuration(format!(
                "agent '{}' references unknown model '{}'",
                agent.name, agent.model
            ))
        })?;
        model.validate().map_err(|e| {
            Error::Configuration(format!("model '{}' is invalid: {e}", agent.model))
        })?;

        let search = match &agent.search {
            Some(name) => Some(self.config.get_search_engine(name).await?.ok_or_else(|| {
                Error::Configuration(format!(
                    "agent '{}' references unknown search engine '{name}'",
                    agent.name
                ))
            })?),
            None => None,
        };

        let system_prompt = match &agent.system_prompt {
            Some(name) => Some(self.prompt_text(name, true).await?),
            None => None,
        };
        let template = match &agent.template {
            Some(name) => Some(self.prompt_text(name, false).await?),
            None => None,
        };

        Ok(ResolvedAgent {
            model,
            search,
            system_prompt,
            template,
        })
    }

    /// Stored prompt by name; an unknown name is used as literal text
    async fn prompt_text(&self, name: &str, system: bool) -> Result<String> {
        let stored = if system {
            self.config.get_system_prompt(name).await?
        } else {
            self.config.get_template(name).await?
        };
        Ok(stored.unwrap_or_else(|| {
            debug!(reference = %name, system, "No stored prompt, using reference as text");
            name.to_string()
        }))
    }

    /// Write the transcript if the run has a conversation
    pub(crate) fn persist(
        &self,
        conversation: Option<&str>,
        provider: ProviderKind,
        transcript: &[Turn],
    ) -> Result<()> {
        let (Some(store), Some(name)) = (&self.conversations, conversation) else {
            return Ok(());
        };
        store.save(name, provider, transcript)
    }

    /// Load a conversation for `provider`
    pub(crate) fn prepare_conversation(
        &self,
        conversation: Option<&str>,
        provider: ProviderKind,
    ) -> Result<Vec<Turn>> {
        match (&self.conversations, conversation) {
            (Some(store), Some(name)) => store.prepare(name, provider),
            (None, Some(name)) => {
                warn!(conversation = %name, "No conversation store configured; not persisting");
                Ok(Vec::new())
            }
            _ => Ok(Vec::new()),
        }
    }
}
