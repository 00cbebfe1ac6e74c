//! Registry - Embedded tool registration and discovery
//!
//! Tools live in one registry per process. Which of them a given agent may
//! call is decided per request by the agent's tool set, not by the registry.

use crate::error::{Error, Result};
use baton_llm::SharedState;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Tool category for organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCategory {
    /// File operations
    File,
    /// Shared blackboard access
    State,
    /// Utility operations
    Utility,
}

impl ToolCategory {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::State => "state",
            Self::Utility => "utility",
        }
    }
}

/// Tool metadata and schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique tool name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// JSON schema for parameters
    pub parameters: serde_json::Value,
    /// Tool category
    pub category: ToolCategory,
    /// Whether the tool is enabled
    pub enabled: bool,
}

impl ToolDefinition {
    /// Create a new tool definition
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
            category: ToolCategory::Utility,
            enabled: true,
        }
    }

    /// Set the parameters schema
    #[must_use]
    pub fn with_parameters(mut self, parameters: serde_json::Value) -> Self {
        self.parameters = parameters;
        self
    }

    /// Set the category
    #[must_use]
    pub fn with_category(mut self, category: ToolCategory) -> Self {
        self.category = category;
        self
    }

    /// Set enabled status
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Result of a tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether execution succeeded
    pub success: bool,
    /// Output data
    pub output: serde_json::Value,
    /// Error message if failed
    pub error: Option<String>,
    /// Execution duration in milliseconds
    pub duration_ms: u64,
}

impl ToolResult {
    /// Create a successful result
    #[must_use]
    pub fn success(output: serde_json::Value, duration_ms: u64) -> Self {
        Self {
            success: true,
            output,
            error: None,
            duration_ms,
        }
    }

    /// Create a failed result
    #[must_use]
    pub fn failure(error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            success: false,
            output: serde_json::Value::Null,
            error: Some(error.into()),
            duration_ms,
        }
    }

    /// Text handed back to the model
    #[must_use]
    pub fn to_content(&self) -> String {
        match (&self.error, &self.output) {
            (Some(err), _) => err.clone(),
            (None, serde_json::Value::String(s)) => s.clone(),
            (None, other) => other.to_string(),
        }
    }
}

/// Per-call context handed to tools
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Agent issuing the call
    pub agent: String,
    /// Blackboard of the current invocation
    pub shared_state: SharedState,
}

impl ToolContext {
    /// Create a context
    #[must_use]
    pub fn new(agent: impl Into<String>, shared_state: SharedState) -> Self {
        Self {
            agent: agent.into(),
            shared_state,
        }
    }
}

/// Trait for tool implementations
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool definition
    fn definition(&self) -> &ToolDefinition;

    /// Execute the tool with given input
    async fn execute(&self, input: serde_json::Value, ctx: &ToolContext) -> Result<ToolResult>;

    /// Validate input before execution
    fn validate_input(&self, input: &serde_json::Value) -> Result<()> {
        if !input.is_object() {
            return Err(Error::InvalidInput("Input must be an object".to_string()));
        }
        Ok(())
    }
}

/// Registry for managing tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    definitions: HashMap<String, ToolDefinition>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            definitions: HashMap::new(),
        }
    }

    /// Register a tool
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let def = tool.definition();
        let name = def.name.clone();
        debug!(tool = %name, "Registering tool");
        self.definitions.insert(name.clone(), def.clone());
        self.tools.insert(name, tool);
    }

    /// Get a tool by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Get a tool definition by name
    #[must_use]
    pub fn get_definition(&self, name: &str) -> Option<&ToolDefinition> {
        self.definitions.get(name)
    }

    /// Check if a tool exists
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Sorted tool names
    #[must_use]
    pub fn list_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Enabled tool definitions, sorted by name
    #[must_use]
    pub fn list_enabled(&self) -> Vec<&ToolDefinition> {
        let mut defs: Vec<&ToolDefinition> =
            self.definitions.values().filter(|d| d.enabled).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Enable a tool
    pub fn enable(&mut self, name: &str) -> bool {
        if let Some(def) = self.definitions.get_mut(name) {
            def.enabled = true;
            true
        } else {
            false
        }
    }

    /// Disable a tool
    pub fn disable(&mut self, name: &str) -> bool {
        if let Some(def) = self.definitions.get_mut(name) {
            def.enabled = false;
            true
        } else {
            false
        }
    }

    /// Get tool count
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Enabled tools accepted by `allow`, in model-facing form
    #[must_use]
    pub fn to_llm_tools(&self, allow: impl Fn(&str) -> bool) -> Vec<baton_llm::ToolDefinition> {
        self.list_enabled()
            .into_iter()
            .filter(|def| allow(&def.name))
            .map(|def| {
                baton_llm::ToolDefinition::new(&def.name, &def.description, def.parameters.clone())
            })
            .collect()
    }

    /// Validate and run a tool
    pub async fn execute(
        &self,
        name: &str,
        input: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolResult> {
        let tool = self
            .get(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        if !self.definitions.get(name).is_some_and(|d| d.enabled) {
            return Err(Error::NotEnabled(name.to_string()));
        }
        tool.validate_input(&input)?;
        tool.execute(input, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct UpperTool {
        definition: ToolDefinition,
    }

    #[async_trait::async_trait]
    impl Tool for UpperTool {
        fn definition(&self) -> &ToolDefinition {
            &self.definition
        }

        async fn execute(
            &self,
            input: serde_json::Value,
            _ctx: &ToolContext,
        ) -> Result<ToolResult> {
            let text = input["text"].as_str().unwrap_or_default().to_uppercase();
            Ok(ToolResult::success(serde_json::json!(text), 0))
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(UpperTool {
            definition: ToolDefinition::new("upper", "Uppercase text"),
        }));
        registry.register(Arc::new(UpperTool {
            definition: ToolDefinition::new("shout", "Uppercase text").with_enabled(false),
        }));
        registry
    }

    #[test]
    fn test_tool_definition_builder() {
        let def = ToolDefinition::new("test_tool", "A test tool")
            .with_category(ToolCategory::File)
            .with_enabled(false);

        assert_eq!(def.name, "test_tool");
        assert_eq!(def.category, ToolCategory::File);
        assert!(!def.enabled);
    }

    #[test]
    fn test_tool_result() {
        let success = ToolResult::success(serde_json::json!({"data": "test"}), 100);
        assert!(success.success);
        assert!(success.error.is_none());
        assert_eq!(success.to_content(), r#"{"data":"test"}"#);

        let failure = ToolResult::failure("test error", 50);
        assert!(!failure.success);
        assert_eq!(failure.to_content(), "test error");
    }

    #[test]
    fn test_to_llm_tools_filters() {
        let registry = registry();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.to_llm_tools(|_| true).len(), 1);
        assert!(registry.to_llm_tools(|name| name != "upper").is_empty());
    }

    #[tokio::test]
    async fn test_execute_checks_enabled() {
        let registry = registry();
        let ctx = ToolContext::new("tester", SharedState::new());

        let out = registry
            .execute("upper", serde_json::json!({"text": "hi"}), &ctx)
            .await
            .unwrap();
        assert_eq!(out.to_content(), "HI");

        assert!(matches!(
            registry.execute("shout", serde_json::json!({}), &ctx).await,
            Err(Error::NotEnabled(_))
        ));
        assert!(matches!(
            registry.execute("missing", serde_json::json!({}), &ctx).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            registry.execute("upper", serde_json::json!("x"), &ctx).await,
            Err(Error::InvalidInput(_))
        ));
    }
}
