//! MCP Protocol Types
//!
//! JSON-RPC 2.0 based protocol types for MCP communication.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Protocol revision sent in `initialize`
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// MCP error type
#[derive(Debug, Error)]
pub enum McpError {
    /// Transport error (I/O, connection, etc.)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Protocol error (invalid JSON-RPC, etc.)
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Server returned an error
    #[error("Server error {code}: {message}")]
    Server {
        /// Error code
        code: i32,
        /// Error message
        message: String,
    },

    /// Timeout waiting for response
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Server not found or not connected
    #[error("Server '{0}' not found")]
    ServerNotFound(String),

    /// No connected server offers the tool
    #[error("Tool '{0}' not found on any connected MCP server")]
    ToolNotFound(String),

    /// Connection already closed
    #[error("Connection to '{0}' is closed")]
    Closed(String),

    /// Manifest could not be read or written
    #[error("Manifest error: {0}")]
    Manifest(String),
}

/// MCP Result type
pub type McpResult<T> = std::result::Result<T, McpError>;

/// JSON-RPC request or notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpRequest {
    /// JSON-RPC version
    pub jsonrpc: String,
    /// Request method
    pub method: String,
    /// Request ID; absent for notifications
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Request parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl McpRequest {
    /// Create a new request
    pub fn new(method: impl Into<String>, id: u64) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            id: Some(id),
            params: None,
        }
    }

    /// Create a notification (no reply expected)
    pub fn notification(method: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            id: None,
            params: None,
        }
    }

    /// Add parameters
    pub fn with_params(mut self, params: Option<serde_json::Value>) -> Self {
        self.params = params;
        self
    }
}

/// JSON-RPC response
///
/// Server-initiated requests and notifications also parse into this shape
/// with no `result`/`error`; callers ignore them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpResponse {
    /// JSON-RPC version
    #[serde(default)]
    pub jsonrpc: String,
    /// Response ID (matches request ID)
    #[serde(default)]
    pub id: Option<u64>,
    /// Method, present only on server-initiated messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Result (on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Error (on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<McpRpcError>,
}

impl McpResponse {
    /// Whether this answers a client request
    #[must_use]
    pub fn is_reply(&self) -> bool {
        self.method.is_none() && self.id.is_some()
    }

    /// Convert into the result value or the server's error
    pub fn into_result(self) -> McpResult<serde_json::Value> {
        if let Some(error) = self.error {
            return Err(McpError::Server {
                code: error.code,
                message: error.message,
            });
        }
        Ok(self.result.unwrap_or(serde_json::Value::Null))
    }
}

/// JSON-RPC error object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpRpcError {
    /// Error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Additional data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// MCP tool definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpTool {
    /// Tool name
    pub name: String,
    /// Tool description
    #[serde(default)]
    pub description: String,
    /// Input schema (JSON Schema)
    #[serde(default = "default_schema", rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

fn default_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {}
    })
}

impl McpTool {
    /// Model-facing definition under the tool's own name
    #[must_use]
    pub fn to_llm_tool(&self) -> baton_llm::ToolDefinition {
        baton_llm::ToolDefinition::new(
            &self.name,
            &self.description,
            self.input_schema.clone(),
        )
    }
}

/// MCP resource descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpResource {
    /// Resource URI
    pub uri: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// MIME type
    #[serde(default, rename = "mimeType", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// MCP prompt argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpPromptArgument {
    /// Argument name
    pub name: String,
    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the argument must be supplied
    #[serde(default)]
    pub required: bool,
}

/// MCP prompt descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpPrompt {
    /// Prompt name
    pub name: String,
    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Arguments
    #[serde(default)]
    pub arguments: Vec<McpPromptArgument>,
}

/// MCP tool call result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpToolResult {
    /// Content items
    #[serde(default)]
    pub content: Vec<McpContent>,
    /// Whether the tool call resulted in an error
    #[serde(default, rename = "isError")]
    pub is_error: bool,
}

impl McpToolResult {
    /// Text items joined by newlines; non-text items are summarised
    #[must_use]
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(|c| match c.as_text() {
                Some(t) => t.to_string(),
                None => match c {
                    McpContent::Image { mime_type, .. } => format!("[image: {mime_type}]"),
                    McpContent::Resource { uri, .. } => format!("[resource: {uri}]"),
                    McpContent::Text { .. } => String::new(),
                },
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// MCP content item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum McpContent {
    /// Text content
    #[serde(rename = "text")]
    Text {
        /// Text content
        text: String,
    },
    /// Image content
    #[serde(rename = "image")]
    Image {
        /// Base64 encoded image data
        data: String,
        /// MIME type
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
    /// Resource content
    #[serde(rename = "resource")]
    Resource {
        /// Resource URI
        uri: String,
        /// Resource text
        #[serde(default)]
        text: Option<String>,
        /// Resource blob (base64)
        #[serde(default)]
        blob: Option<String>,
    },
}

impl McpContent {
    /// Get text representation of content
    pub fn as_text(&self) -> Option<&str> {
        match self {
            McpContent::Text { text } => Some(text),
            McpContent::Resource { text: Some(t), .. } => Some(t),
            _ => None,
        }
    }
}

/// MCP server capabilities
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct McpCapabilities {
    /// Tool capabilities
    #[serde(default)]
    pub tools: Option<serde_json::Value>,
    /// Resource capabilities
    #[serde(default)]
    pub resources: Option<serde_json::Value>,
    /// Prompt capabilities
    #[serde(default)]
    pub prompts: Option<serde_json::Value>,
}

/// MCP initialization result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpInitResult {
    /// Protocol version
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    /// Server capabilities
    #[serde(default)]
    pub capabilities: McpCapabilities,
    /// Server info
    #[serde(default, rename = "serverInfo")]
    pub server_info: Option<ServerInfo>,
}

/// Server information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Server name
    pub name: String,
    /// Server version
    #[serde(default)]
    pub version: Option<String>,
}

/// `initialize` parameters announcing this client
#[must_use]
pub fn initialize_params() -> serde_json::Value {
    serde_json::json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {},
        "clientInfo": {
            "name": "baton",
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mcp_request_serialization() {
        let request = McpRequest::new("tools/list", 1);
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"jsonrpc\":\"2.0\""));
        assert!(json.contains("\"method\":\"tools/list\""));

        let note = serde_json::to_string(&McpRequest::notification("notifications/initialized"))
            .unwrap();
        assert!(!note.contains("\"id\""));
    }

    #[test]
    fn test_mcp_tool_deserialization() {
        let json = r#"{
            "name": "read_file",
            "description": "Read a file from disk",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "path": {"type": "string"}
                },
                "required": ["path"]
            }
        }"#;

        let tool: McpTool = serde_json::from_str(json).unwrap();
        assert_eq!(tool.name, "read_file");
        assert_eq!(tool.to_llm_tool().name, "read_file");
    }

    #[test]
    fn test_response_classification() {
        let reply: McpResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":3,"result":{"ok":true}}"#).unwrap();
        assert!(reply.is_reply());
        assert_eq!(reply.into_result().unwrap()["ok"], true);

        let note: McpResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","method":"notifications/tools/list_changed"}"#,
        )
        .unwrap();
        assert!(!note.is_reply());

        let failed: McpResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":4,"error":{"code":-32601,"message":"no such method"}}"#,
        )
        .unwrap();
        assert!(matches!(
            failed.into_result(),
            Err(McpError::Server { code: -32601, .. })
        ));
    }

    #[test]
    fn test_tool_result_text() {
        let result: McpToolResult = serde_json::from_str(
            r#"{"content":[{"type":"text","text":"a"},{"type":"image","data":"","mimeType":"image/png"}],"isError":false}"#,
        )
        .unwrap();
        assert_eq!(result.text(), "a\n[image: image/png]");
    }
}
