//! Tool types for LLM function calling
//!
//! This module defines the types used for LLM tool/function calling capabilities.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Tool definition for function calling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name
    pub name: String,
    /// Tool description
    pub description: String,
    /// JSON schema for parameters
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Create a new tool definition
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A tool call requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique ID for this tool call
    pub id: String,
    /// Tool name
    pub name: String,
    /// Arguments object
    pub arguments: serde_json::Value,
}

impl ToolCall {
    /// Create a new tool call
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Parse arguments as a typed value
    pub fn parse_arguments<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.arguments.clone())
            .map_err(|e| Error::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_definition() {
        let tool = ToolDefinition::new(
            "get_weather",
            "Get the current weather",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "location": {"type": "string"}
                },
                "required": ["location"]
            }),
        );

        assert_eq!(tool.name, "get_weather");
        assert_eq!(tool.description, "Get the current weather");
    }

    #[test]
    fn test_tool_call_parse_arguments() {
        let tool_call = ToolCall::new(
            "call_123",
            "get_weather",
            serde_json::json!({"location": "Seoul"}),
        );

        #[derive(Deserialize)]
        struct Args {
            location: String,
        }

        let args: Args = tool_call.parse_arguments().unwrap();
        assert_eq!(args.location, "Seoul");
    }

    #[test]
    fn test_tool_call_parse_arguments_mismatch() {
        let tool_call = ToolCall::new("call_1", "x", serde_json::json!("not an object"));

        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Args {
            location: String,
        }

        assert!(tool_call.parse_arguments::<Args>().is_err());
    }
}
