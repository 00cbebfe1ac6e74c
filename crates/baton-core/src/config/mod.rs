//! Application configuration
//!
//! The on-disk configuration (`~/.baton/config.toml`) and the store the
//! runner reads agents, models and prompts from.
//!
//! ```toml
//! [agents.coder]
//! model = "fast"
//! tools = ["file_read", "file_write"]
//! capabilities = ["mcp"]
//! max_recursions = 10
//!
//! [models.fast]
//! provider = "openai"
//! model = "gpt-4o-mini"
//! api_key = "${OPENAI_API_KEY}"
//! ```

mod store;

pub use store::{ConfigStore, FileConfigStore};

use crate::agents::{default_max_recursions, AgentConfig};
use crate::error::{Error, Result};
use crate::workflow::WorkflowAgent;
use baton_llm::{ModelConfig, SearchEngineConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Directory holding Baton's state (`~/.baton`)
#[must_use]
pub fn baton_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".baton")
}

/// Default config file location
#[must_use]
pub fn default_config_path() -> PathBuf {
    baton_home().join("config.toml")
}

fn default_conversations_dir() -> PathBuf {
    baton_home().join("conversations")
}

/// Runner limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerSettings {
    /// Budget used when a workflow stage does not set one
    #[serde(default = "default_max_recursions")]
    pub default_max_recursions: i32,
    /// Maximum number of files attached to one prompt
    #[serde(default = "default_max_attachments")]
    pub max_attachments: usize,
    /// Files larger than this are skipped
    #[serde(default = "default_max_attachment_bytes")]
    pub max_attachment_bytes: u64,
}

fn default_max_attachments() -> usize {
    32
}

fn default_max_attachment_bytes() -> u64 {
    10 * 1024 * 1024
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            default_max_recursions: default_max_recursions(),
            max_attachments: default_max_attachments(),
            max_attachment_bytes: default_max_attachment_bytes(),
        }
    }
}

/// MCP client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpSettings {
    /// Server manifest location
    #[serde(default = "default_manifest_path")]
    pub manifest: PathBuf,
    /// Per-server connect and handshake timeout
    #[serde(default = "default_init_timeout_secs")]
    pub init_timeout_secs: u64,
}

fn default_manifest_path() -> PathBuf {
    baton_home().join("mcp.json")
}

fn default_init_timeout_secs() -> u64 {
    30
}

impl Default for McpSettings {
    fn default() -> Self {
        Self {
            manifest: default_manifest_path(),
            init_timeout_secs: default_init_timeout_secs(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Console format
    #[serde(default)]
    pub format: LogFormat,
    /// Also write a daily-rolling log file at this path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "baton=info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Text,
            file: None,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where transcripts are stored
    #[serde(default = "default_conversations_dir")]
    pub conversations_dir: PathBuf,
    /// Agent definitions by name
    #[serde(default)]
    pub agents: BTreeMap<String, AgentConfig>,
    /// Model definitions by name
    #[serde(default)]
    pub models: BTreeMap<String, ModelConfig>,
    /// Search engines by name
    #[serde(default)]
    pub search_engines: BTreeMap<String, SearchEngineConfig>,
    /// Prompt templates by name
    #[serde(default)]
    pub templates: BTreeMap<String, String>,
    /// System prompts by name
    #[serde(default)]
    pub system_prompts: BTreeMap<String, String>,
    /// Default workflow pipeline
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workflow: Vec<WorkflowAgent>,
    /// Runner limits
    #[serde(default)]
    pub runner: RunnerSettings,
    /// MCP client settings
    #[serde(default)]
    pub mcp: McpSettings,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            agents: BTreeMap::new(),
            models: BTreeMap::new(),
            search_engines: BTreeMap::new(),
            templates: BTreeMap::new(),
            system_prompts: BTreeMap::new(),
            workflow: Vec::new(),
            runner: RunnerSettings::default(),
            mcp: McpSettings::default(),
            logging: LoggingSettings::default(),
            conversations_dir: default_conversations_dir(),
        }
    }
}

impl AppConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content).map_err(|e| Error::InvalidConfig {
            field: "config".to_string(),
            message: e.to_string(),
        })?;
        Ok(config.normalize())
    }

    /// Load from a TOML file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Fill names that were left out in favour of the table key
    #[must_use]
    pub fn normalize(mut self) -> Self {
        for (key, agent) in &mut self.agents {
            if agent.name.is_empty() {
                agent.name.clone_from(key);
            }
        }
        for (key, engine) in &mut self.search_engines {
            if engine.name.is_empty() {
                engine.name.clone_from(key);
            }
        }
        self
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Internal(format!("config encode: {e}")))
    }

    /// Save to a TOML file, replacing it atomically
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_toml_string()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Validate every agent and its references
    pub fn validate(&self) -> Result<()> {
        for agent in self.agents.values() {
            agent.validate()?;
            if !self.models.contains_key(&agent.model) {
                return Err(Error::InvalidConfig {
                    field: format!("agents.{}.model", agent.name),
                    message: format!("unknown model '{}'", agent.model),
                });
            }
            if let Some(search) = &agent.search {
                if !self.search_engines.contains_key(search) {
                    return Err(Error::InvalidConfig {
                        field: format!("agents.{}.search", agent.name),
                        message: format!("unknown search engine '{search}'"),
                    });
                }
            }
        }
        for (name, model) in &self.models {
            model.validate().map_err(|e| Error::InvalidConfig {
                field: format!("models.{name}"),
                message: e.to_string(),
            })?;
        }
        if self.runner.default_max_recursions != -1 && self.runner.default_max_recursions <= 0 {
            return Err(Error::InvalidConfig {
                field: "runner.default_max_recursions".to_string(),
                message: "must be -1 (unlimited) or greater than 0".to_string(),
            });
        }
        Ok(())
    }
}
