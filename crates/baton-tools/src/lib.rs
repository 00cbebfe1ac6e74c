//! Baton Tools - Embedded Tools and MCP Client
//!
//! This crate provides everything an agent can call:
//! - Registry: embedded tool registration and discovery
//! - Builtins: file and blackboard tools
//! - MCP: client for external Model Context Protocol servers

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod builtins;
pub mod error;
pub mod mcp;
pub mod registry;

pub use builtins::register_builtins;
pub use error::{Error, Result};
pub use registry::{Tool, ToolCategory, ToolContext, ToolDefinition, ToolRegistry, ToolResult};
