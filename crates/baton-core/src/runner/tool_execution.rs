//! Runner tool execution
//!
//! Embedded tools are tried first, then the MCP catalog. Any failure becomes
//! an error tool result so the model can react to it.

use crate::agents::AgentConfig;
use crate::error::Error;
use baton_llm::{Capability, Part, SharedState, ToolCall, ToolDefinition};
use baton_tools::mcp::McpError;
use baton_tools::ToolContext;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use super::core::AgentRunner;

impl AgentRunner {
    /// Tool definitions offered to the model for `agent`
    pub(crate) async fn tool_definitions(&self, agent: &AgentConfig) -> Vec<ToolDefinition> {
        let mut tools = self.tools.to_llm_tools(|name| agent.is_tool_allowed(name));

        if agent.has_capability(Capability::Mcp) {
            if let Some(mcp) = &self.mcp {
                let mut seen: HashSet<String> = tools.iter().map(|t| t.name.clone()).collect();
                for tool in mcp.llm_tools().await {
                    if seen.insert(tool.name.clone()) {
                        tools.push(tool);
                    } else {
                        debug!(tool = %tool.name, "MCP tool shadowed by embedded tool");
                    }
                }
            }
        }
        tools
    }

    /// Reachable MCP servers visible to `agent`
    pub(crate) async fn mcp_servers(&self, agent: &AgentConfig) -> Vec<String> {
        match &self.mcp {
            Some(mcp) if agent.has_capability(Capability::Mcp) => mcp.reachable_servers().await,
            _ => Vec::new(),
        }
    }

    /// Run every call in order, producing one result part per call
    pub(crate) async fn execute_tool_calls(
        &self,
        agent: &AgentConfig,
        calls: &[ToolCall],
        shared_state: &SharedState,
    ) -> Vec<Part> {
        let ctx = ToolContext::new(&agent.name, shared_state.clone());
        let mut results = Vec::with_capacity(calls.len());

        for call in calls {
            info!(agent = %agent.name, tool = %call.name, "Executing tool");

            let (content, is_error) = match self.dispatch(agent, call, &ctx).await {
                Ok((content, is_error)) => (content, is_error),
                Err(e) => {
                    warn!(agent = %agent.name, tool = %call.name, error = %e, "Tool call failed");
                    (e.to_string(), true)
                }
            };
            results.push(Part::tool_result(&call.id, &call.name, content, is_error));
        }
        results
    }

    async fn dispatch(
        &self,
        agent: &AgentConfig,
        call: &ToolCall,
        ctx: &ToolContext,
    ) -> Result<(String, bool), Error> {
        if self.tools.has(&call.name) && agent.is_tool_allowed(&call.name) {
            let result = self
                .tools
                .execute(&call.name, call.arguments.clone(), ctx)
                .await
                .map_err(|e| tool_error(&call.name, e))?;
            return Ok((result.to_content(), !result.success));
        }

        if agent.has_capability(Capability::Mcp) {
            if let Some(mcp) = &self.mcp {
                return match mcp.call_tool_by_name(&call.name, call.arguments.clone()).await {
                    Ok(result) => Ok((result.text(), result.is_error)),
                    Err(McpError::ToolNotFound(_)) => Err(unavailable(&call.name)),
                    Err(e) => Err(tool_error(&call.name, e)),
                };
            }
        }

        Err(unavailable(&call.name))
    }
}

fn unavailable(tool: &str) -> Error {
    Error::ToolExecution {
        tool: tool.to_string(),
        message: "unknown tool or not enabled for this agent".to_string(),
    }
}

fn tool_error(tool: &str, e: impl std::fmt::Display) -> Error {
    Error::ToolExecution {
        tool: tool.to_string(),
        message: e.to_string(),
    }
}
