//! Application context shared by the CLI commands

use anyhow::{Context, Result};
use baton_core::{AgentRunner, AppConfig, ConversationStore, FileConfigStore};
use baton_llm::{EchoBackend, ModelBackend};
use baton_tools::mcp::{McpClient, McpManifest};
use baton_tools::{register_builtins, ToolRegistry};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::loader::load_config;

/// Loaded configuration plus the stores built from it
pub struct App {
    /// Merged configuration
    pub config: AppConfig,
    /// User config file
    pub config_path: PathBuf,
    /// In-memory store over the merged configuration, handed to the runner
    pub store: Arc<FileConfigStore>,
}

impl App {
    /// Load configuration and open the config store
    pub fn load(config_path: PathBuf) -> Result<Self> {
        let config = load_config(&config_path)?;
        debug!(path = %config_path.display(), agents = config.agents.len(), "Configuration loaded");
        let store = Arc::new(FileConfigStore::in_memory(config.clone()));
        Ok(Self {
            config,
            config_path,
            store,
        })
    }

    /// Transcript store under `conversations_dir`
    pub fn conversations(&self) -> ConversationStore {
        ConversationStore::new(&self.config.conversations_dir)
    }

    /// MCP manifest, empty when the file does not exist
    pub fn manifest(&self) -> Result<McpManifest> {
        load_manifest(&self.config.mcp.manifest)
    }

    /// MCP client over the manifest's servers; not yet initialized
    pub fn mcp_client(&self) -> Result<McpClient> {
        let manifest = self.manifest()?;
        Ok(McpClient::new(manifest.server_configs())
            .with_timeout(Duration::from_secs(self.config.mcp.init_timeout_secs)))
    }

    /// Model backend for live runs
    ///
    /// No vendor backend is linked into this binary, so runs echo the
    /// effective prompt.
    pub fn backend(&self, dry_run: bool) -> Arc<dyn ModelBackend> {
        if !dry_run {
            warn!("No vendor model backend is linked; answers echo the effective prompt");
        }
        Arc::new(EchoBackend)
    }

    /// Runner wired to this application's stores
    pub fn runner(&self, backend: Arc<dyn ModelBackend>, mcp: Option<Arc<McpClient>>) -> AgentRunner {
        let mut tools = ToolRegistry::new();
        register_builtins(&mut tools);

        let store: Arc<dyn baton_core::ConfigStore> = self.store.clone();
        let mut runner = AgentRunner::new(backend, store)
            .with_tools(Arc::new(tools))
            .with_conversations(self.conversations())
            .with_settings(self.config.runner.clone());
        if let Some(mcp) = mcp {
            runner = runner.with_mcp(mcp);
        }
        runner
    }
}

/// Load a manifest with path context
pub fn load_manifest(path: &Path) -> Result<McpManifest> {
    McpManifest::load(path).with_context(|| format!("Failed to read MCP manifest {}", path.display()))
}
