//! Agent Configuration
//!
//! Configuration types for defining agents and their behavior.

use crate::error::{Error, Result};
use baton_llm::{Capability, ThinkLevel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// `max_recursions` value that disables the budget
pub const UNLIMITED_RECURSIONS: i32 = -1;

/// Default tool-round budget
#[must_use]
pub fn default_max_recursions() -> i32 {
    10
}

/// Agent configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Agent name (filled from the config key when omitted)
    #[serde(default)]
    pub name: String,
    /// Model reference (key under `[models]`)
    pub model: String,
    /// Enabled embedded tools; `*` enables all of them
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tools: BTreeSet<String>,
    /// Capability flags
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub capabilities: BTreeSet<Capability>,
    /// System prompt reference (key under `[system_prompts]`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Template reference (key under `[templates]`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Search engine reference (key under `[search_engines]`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Tool-round budget; -1 for none
    #[serde(default = "default_max_recursions")]
    pub max_recursions: i32,
    /// Reasoning effort
    #[serde(default)]
    pub think: ThinkLevel,
}

impl AgentConfig {
    /// Create an agent with defaults
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            tools: BTreeSet::new(),
            capabilities: BTreeSet::new(),
            system_prompt: None,
            template: None,
            search: None,
            max_recursions: default_max_recursions(),
            think: ThinkLevel::Off,
        }
    }

    /// Enable embedded tools
    #[must_use]
    pub fn with_tools(mut self, tools: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tools.extend(tools.into_iter().map(Into::into));
        self
    }

    /// Enable a capability
    #[must_use]
    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.insert(capability);
        self
    }

    /// Set the system prompt reference
    #[must_use]
    pub fn with_system_prompt(mut self, name: impl Into<String>) -> Self {
        self.system_prompt = Some(name.into());
        self
    }

    /// Set the template reference
    #[must_use]
    pub fn with_template(mut self, name: impl Into<String>) -> Self {
        self.template = Some(name.into());
        self
    }

    /// Set the search engine reference
    #[must_use]
    pub fn with_search(mut self, name: impl Into<String>) -> Self {
        self.search = Some(name.into());
        self
    }

    /// Set the tool-round budget
    #[must_use]
    pub fn with_max_recursions(mut self, max_recursions: i32) -> Self {
        self.max_recursions = max_recursions;
        self
    }

    /// Set the reasoning effort
    #[must_use]
    pub fn with_think(mut self, think: ThinkLevel) -> Self {
        self.think = think;
        self
    }

    /// Whether a capability is enabled
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Whether an embedded tool is enabled for this agent
    pub fn is_tool_allowed(&self, tool_name: &str) -> bool {
        self.tools.contains("*") || self.tools.contains(tool_name)
    }

    /// Whether the budget is unlimited
    pub fn is_unlimited(&self) -> bool {
        self.max_recursions == UNLIMITED_RECURSIONS
    }

    /// Check the definition is usable on its own
    ///
    /// Cross-references (model, search engine) are checked by the store.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidConfig {
                field: "agents.<name>".to_string(),
                message: "agent name must not be empty".to_string(),
            });
        }
        if self.model.trim().is_empty() {
            return Err(Error::InvalidConfig {
                field: format!("agents.{}.model", self.name),
                message: "model reference must not be empty".to_string(),
            });
        }
        if self.max_recursions != UNLIMITED_RECURSIONS && self.max_recursions <= 0 {
            return Err(Error::InvalidConfig {
                field: format!("agents.{}.max_recursions", self.name),
                message: format!(
                    "must be -1 (unlimited) or greater than 0, got {}",
                    self.max_recursions
                ),
            });
        }
        Ok(())
    }
}
