//! Blackboard tools - read and write the invocation's shared state

use crate::error::{Error, Result};
use crate::registry::{Tool, ToolCategory, ToolContext, ToolDefinition, ToolResult};
use std::time::Instant;
use tracing::debug;

/// Tool for reading shared state
pub struct StateGetTool {
    definition: ToolDefinition,
}

impl StateGetTool {
    /// Create a new state read tool
    #[must_use]
    pub fn new() -> Self {
        let definition = ToolDefinition::new(
            "state_get",
            "Read a value other agents stored on the shared blackboard. Omit 'key' to list keys.",
        )
        .with_category(ToolCategory::State)
        .with_parameters(serde_json::json!({
            "type": "object",
            "properties": {
                "key": {
                    "type": "string",
                    "description": "Key to read"
                }
            }
        }));

        Self { definition }
    }
}

impl Default for StateGetTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for StateGetTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, input: serde_json::Value, ctx: &ToolContext) -> Result<ToolResult> {
        let start = Instant::now();

        let output = match input.get("key").and_then(|v| v.as_str()) {
            Some(key) => {
                debug!(agent = %ctx.agent, key = %key, "Reading shared state");
                serde_json::json!({
                    "key": key,
                    "found": ctx.shared_state.get(key).is_some(),
                    "value": ctx.shared_state.get(key),
                })
            }
            None => serde_json::json!({ "keys": ctx.shared_state.keys() }),
        };

        Ok(ToolResult::success(
            output,
            start.elapsed().as_millis() as u64,
        ))
    }
}

/// Tool for writing shared state
pub struct StateSetTool {
    definition: ToolDefinition,
}

impl StateSetTool {
    /// Create a new state write tool
    #[must_use]
    pub fn new() -> Self {
        let definition = ToolDefinition::new(
            "state_set",
            "Store a JSON value on the shared blackboard for later agents",
        )
        .with_category(ToolCategory::State)
        .with_parameters(serde_json::json!({
            "type": "object",
            "properties": {
                "key": {
                    "type": "string",
                    "description": "Key to write"
                },
                "value": {
                    "description": "Any JSON value; null removes the key"
                }
            },
            "required": ["key", "value"]
        }));

        Self { definition }
    }
}

impl Default for StateSetTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for StateSetTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, input: serde_json::Value, ctx: &ToolContext) -> Result<ToolResult> {
        let start = Instant::now();

        let key = input
            .get("key")
            .and_then(|v| v.as_str())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::InvalidInput("Missing 'key' parameter".to_string()))?;
        let value = input
            .get("value")
            .cloned()
            .ok_or_else(|| Error::InvalidInput("Missing 'value' parameter".to_string()))?;

        debug!(agent = %ctx.agent, key = %key, "Writing shared state");

        let previous = if value.is_null() {
            ctx.shared_state.remove(key)
        } else {
            ctx.shared_state.set(key, value)
        };

        Ok(ToolResult::success(
            serde_json::json!({
                "key": key,
                "replaced": previous.is_some()
            }),
            start.elapsed().as_millis() as u64,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use baton_llm::SharedState;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_get_remove() {
        let state = SharedState::new();
        let ctx = ToolContext::new("planner", state.clone());

        let set = StateSetTool::new()
            .execute(json!({"key": "plan", "value": {"steps": 3}}), &ctx)
            .await
            .unwrap();
        assert_eq!(set.output["replaced"], false);
        assert_eq!(state.get("plan"), Some(json!({"steps": 3})));

        let get = StateGetTool::new()
            .execute(json!({"key": "plan"}), &ctx)
            .await
            .unwrap();
        assert_eq!(get.output["found"], true);
        assert_eq!(get.output["value"]["steps"], 3);

        let keys = StateGetTool::new().execute(json!({}), &ctx).await.unwrap();
        assert_eq!(keys.output["keys"], json!(["plan"]));

        StateSetTool::new()
            .execute(json!({"key": "plan", "value": null}), &ctx)
            .await
            .unwrap();
        assert!(state.is_empty());
    }

    #[tokio::test]
    async fn test_set_requires_key() {
        let ctx = ToolContext::new("planner", SharedState::new());
        let result = StateSetTool::new()
            .execute(json!({"value": 1}), &ctx)
            .await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
