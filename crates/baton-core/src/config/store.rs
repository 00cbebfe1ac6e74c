//! Configuration store
//!
//! Read/write access to agents, models, search engines and prompts.

use super::AppConfig;
use crate::agents::AgentConfig;
use crate::error::Result;
use async_trait::async_trait;
use baton_llm::{ModelConfig, SearchEngineConfig};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::debug;

/// Trait for configuration storage
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Get an agent by name
    async fn get_agent(&self, name: &str) -> Result<Option<AgentConfig>>;

    /// Insert or replace an agent
    async fn set_agent(&self, agent: AgentConfig) -> Result<()>;

    /// Get a model by name
    async fn get_model(&self, name: &str) -> Result<Option<ModelConfig>>;

    /// Get a search engine by name
    async fn get_search_engine(&self, name: &str) -> Result<Option<SearchEngineConfig>>;

    /// Get a prompt template by name
    async fn get_template(&self, name: &str) -> Result<Option<String>>;

    /// Get a system prompt by name
    async fn get_system_prompt(&self, name: &str) -> Result<Option<String>>;

    /// List agent names
    async fn list_agents(&self) -> Result<Vec<String>>;
}

/// Config store backed by an [`AppConfig`], optionally persisted to a TOML file
pub struct FileConfigStore {
    config: RwLock<AppConfig>,
    path: Option<PathBuf>,
}

impl FileConfigStore {
    /// Store that never touches disk
    #[must_use]
    pub fn in_memory(config: AppConfig) -> Self {
        Self {
            config: RwLock::new(config.normalize()),
            path: None,
        }
    }

    /// Store that writes back to `path` on every change
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let config = AppConfig::load(&path)?;
        Ok(Self {
            config: RwLock::new(config),
            path: Some(path),
        })
    }

    /// Wrap an already loaded config that belongs to `path`
    #[must_use]
    pub fn with_path(config: AppConfig, path: impl Into<PathBuf>) -> Self {
        Self {
            config: RwLock::new(config.normalize()),
            path: Some(path.into()),
        }
    }

    /// Backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Copy of the current configuration
    pub fn snapshot(&self) -> AppConfig {
        self.config
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn read<T>(&self, f: impl FnOnce(&AppConfig) -> T) -> T {
        let guard = self.config.read().unwrap_or_else(|e| e.into_inner());
        f(&guard)
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn get_agent(&self, name: &str) -> Result<Option<AgentConfig>> {
        Ok(self.read(|c| c.agents.get(name).cloned()))
    }

    async fn set_agent(&self, agent: AgentConfig) -> Result<()> {
        agent.validate()?;

        let snapshot = {
            let mut guard = self.config.write().unwrap_or_else(|e| e.into_inner());
            guard.agents.insert(agent.name.clone(), agent.clone());
            guard.clone()
        };

        if let Some(path) = &self.path {
            snapshot.save(path)?;
            debug!(agent = %agent.name, path = %path.display(), "Agent saved");
        }
        Ok(())
    }

    async fn get_model(&self, name: &str) -> Result<Option<ModelConfig>> {
        Ok(self.read(|c| c.models.get(name).cloned()))
    }

    async fn get_search_engine(&self, name: &str) -> Result<Option<SearchEngineConfig>> {
        Ok(self.read(|c| c.search_engines.get(name).cloned()))
    }

    async fn get_template(&self, name: &str) -> Result<Option<String>> {
        Ok(self.read(|c| c.templates.get(name).cloned()))
    }

    async fn get_system_prompt(&self, name: &str) -> Result<Option<String>> {
        Ok(self.read(|c| c.system_prompts.get(name).cloned()))
    }

    async fn list_agents(&self) -> Result<Vec<String>> {
        Ok(self.read(|c| c.agents.keys().cloned().collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use baton_llm::ProviderKind;

    fn sample() -> AppConfig {
        let mut config = AppConfig::default();
        config.models.insert(
            "fast".to_string(),
            ModelConfig::new(ProviderKind::Anthropic, "claude-3-5-haiku"),
        );
        config
            .agents
            .insert("coder".to_string(), AgentConfig::new("", "fast"));
        config
            .templates
            .insert("review".to_string(), "Review this".to_string());
        config
    }

    #[tokio::test]
    async fn test_in_memory_lookup() {
        let store = FileConfigStore::in_memory(sample());

        let agent = store.get_agent("coder").await.unwrap().unwrap();
        assert_eq!(agent.name, "coder");
        assert!(store.get_agent("nobody").await.unwrap().is_none());
        assert_eq!(
            store.get_model("fast").await.unwrap().unwrap().provider,
            ProviderKind::Anthropic
        );
        assert_eq!(
            store.get_template("review").await.unwrap().as_deref(),
            Some("Review this")
        );
        assert!(store.get_system_prompt("review").await.unwrap().is_none());
        assert_eq!(store.list_agents().await.unwrap(), vec!["coder"]);
    }

    #[tokio::test]
    async fn test_set_agent_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        sample().normalize().save(&path).unwrap();

        let store = FileConfigStore::open(&path).unwrap();
        store
            .set_agent(AgentConfig::new("writer", "fast").with_max_recursions(-1))
            .await
            .unwrap();

        let reopened = FileConfigStore::open(&path).unwrap();
        let writer = reopened.get_agent("writer").await.unwrap().unwrap();
        assert_eq!(writer.max_recursions, -1);
        assert_eq!(reopened.list_agents().await.unwrap(), vec!["coder", "writer"]);
    }

    #[tokio::test]
    async fn test_set_agent_rejects_invalid() {
        let store = FileConfigStore::in_memory(sample());
        let result = store
            .set_agent(AgentConfig::new("bad", "fast").with_max_recursions(0))
            .await;
        assert!(result.is_err());
        assert!(store.get_agent("bad").await.unwrap().is_none());
    }
}
