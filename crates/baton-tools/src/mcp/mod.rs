//! MCP (Model Context Protocol) Client
//!
//! This module connects agents to external MCP servers and aggregates their
//! tool, resource and prompt catalogs.
//!
//! ## Supported Transports
//!
//! - **stdio**: Spawns a child process and exchanges newline-delimited JSON-RPC
//! - **http**: Streamable HTTP; replies come back as JSON or an event stream
//! - **sse**: Legacy event stream; the `endpoint` event names the POST URL
//!
//! ## Usage
//!
//! ```no_run
//! use baton_tools::mcp::{InitOptions, McpClient, McpServerConfig, McpTransport};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = McpServerConfig::new(
//!     "filesystem",
//!     McpTransport::Stdio {
//!         command: "npx".to_string(),
//!         args: vec!["-y".to_string(), "@modelcontextprotocol/server-filesystem".to_string()],
//!         env: Default::default(),
//!     },
//! );
//!
//! let client = McpClient::new(vec![config]);
//! client.init(InitOptions::default()).await?;
//! let servers = client.get_all_servers().await;
//! client.close().await;
//! # Ok(())
//! # }
//! ```

mod client;
mod http;
mod manifest;
mod protocol;
mod transport;

pub use client::{InitOptions, McpClient, ServerCatalogEntry, DEFAULT_INIT_TIMEOUT};
pub use http::{HttpSession, SseSession};
pub use manifest::{ManifestServer, McpManifest};
pub use protocol::{
    McpContent, McpError, McpPrompt, McpRequest, McpResource, McpResponse, McpResult, McpTool,
    McpToolResult, PROTOCOL_VERSION,
};
pub use transport::{
    Connector, McpServerConfig, McpSession, McpTransport, StdioSession, TransportConnector,
};
