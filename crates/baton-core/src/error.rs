//! Error types for baton-core
//!
//! This module provides error types and user-friendly error formatting.

use baton_llm::{ProviderKind, Turn};
use baton_tools::mcp::McpError;
use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or unusable agent, model or search engine
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A specific setting is invalid
    #[error("invalid configuration: {field}: {message}")]
    InvalidConfig {
        /// Config field name
        field: String,
        /// Detailed message
        message: String,
    },

    /// The agent kept calling tools past its budget
    #[error("agent '{agent}' exceeded its recursion budget of {limit}")]
    RecursionBudgetExceeded {
        /// Agent that hit the limit
        agent: String,
        /// Configured budget
        limit: i32,
        /// Conversation up to the abort, already persisted
        transcript: Vec<Turn>,
    },

    /// Stored transcript does not match the active provider
    #[error("conversation stored as {detected} cannot be used with {expected}")]
    FormatIncompatible {
        /// Format found on disk
        detected: ProviderKind,
        /// Provider of the active model
        expected: ProviderKind,
    },

    /// A tool call failed; rendered into the tool result
    #[error("tool '{tool}' failed: {message}")]
    ToolExecution {
        /// Tool name
        tool: String,
        /// Failure description
        message: String,
    },

    /// MCP server communication failed
    #[error("mcp error: {0}")]
    Transport(#[from] McpError),

    /// Workflow definition rejected
    #[error("invalid workflow: {0}")]
    InvalidWorkflow(String),

    /// A workflow stage failed; later stages did not run
    #[error("workflow stage {index} ('{stage}') failed: {source}")]
    StageFailed {
        /// Stage agent name
        stage: String,
        /// Zero-based stage index
        index: usize,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// The run was cancelled
    #[error("cancelled")]
    Cancelled,

    /// LLM backend error
    #[error("llm error: {0}")]
    Llm(#[from] baton_llm::Error),

    /// Tool registry error
    #[error("tool error: {0}")]
    Tool(#[from] baton_tools::Error),

    /// Filesystem error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Transcript carried by a budget abort, looking through stage failures
    #[must_use]
    pub fn transcript(&self) -> Option<&[Turn]> {
        match self {
            Error::RecursionBudgetExceeded { transcript, .. } => Some(transcript),
            Error::StageFailed { source, .. } => source.transcript(),
            _ => None,
        }
    }
}

/// Trait for user-friendly error messages
///
/// Provides human-readable error messages and suggestions for fixing.
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get a suggestion for how to fix the error
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for Error {
    fn user_message(&self) -> String {
        match self {
            Error::Configuration(msg) => format!("⚙️ Configuration error: {msg}"),
            Error::InvalidConfig { field, message } => {
                format!("⚙️ Configuration error in '{field}': {message}")
            }
            Error::RecursionBudgetExceeded {
                agent,
                limit,
                transcript,
            } => format!(
                "🔁 Agent '{agent}' stopped after {limit} tool rounds ({} turns kept).",
                transcript.len()
            ),
            Error::FormatIncompatible { detected, expected } => {
                format!("💬 Conversation is stored as {detected}, the model expects {expected}.")
            }
            Error::ToolExecution { tool, message } => {
                format!("🔧 Tool '{tool}' failed: {message}")
            }
            Error::Transport(e) => format!("🔌 MCP server error: {e}"),
            Error::InvalidWorkflow(msg) => format!("📋 Invalid workflow: {msg}"),
            Error::StageFailed { stage, index, source } => format!(
                "📋 Workflow stopped at stage {} ('{stage}'): {}",
                index + 1,
                source.user_message()
            ),
            Error::Cancelled => "✋ Cancelled.".to_string(),
            Error::Llm(e) => format!("🤖 Model error: {e}"),
            Error::Tool(e) => format!("🔧 Tool error: {e}"),
            Error::Io(e) => format!("📁 File error: {e}"),
            Error::Serialization(e) => format!("📄 Data format error: {e}"),
            Error::Internal(msg) => format!("❌ Internal error: {msg}"),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            Error::Configuration(_) => Some(
                "💡 Check the [agents] and [models] sections of ~/.baton/config.toml.".to_string(),
            ),
            Error::InvalidConfig { field, .. } => Some(format!(
                "💡 Check the '{field}' setting in your config file or BATON__ environment variables."
            )),
            Error::RecursionBudgetExceeded { .. } => Some(
                "💡 Raise max_recursions for the agent, or set it to -1 for no limit.".to_string(),
            ),
            Error::Transport(_) => {
                Some("💡 Run `baton mcp list --all` to see which servers are reachable.".to_string())
            }
            Error::InvalidWorkflow(_) => {
                Some("💡 Run `baton workflow validate` to check the pipeline.".to_string())
            }
            Error::StageFailed { source, .. } => source.suggestion(),
            _ => None,
        }
    }
}

/// Format an error for display in the CLI
pub fn format_error_for_cli(error: &Error) -> String {
    let mut output = String::new();

    output.push_str(&error.user_message());
    output.push('\n');

    if let Some(suggestion) = error.suggestion() {
        output.push('\n');
        output.push_str(&suggestion);
        output.push('\n');
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_message() {
        let error = Error::InvalidConfig {
            field: "agents.writer.max_recursions".to_string(),
            message: "must be -1 or greater than 0".to_string(),
        };

        let msg = error.user_message();
        assert!(msg.contains("agents.writer.max_recursions"));
        assert!(msg.contains("greater than 0"));

        let suggestion = error.suggestion().unwrap();
        assert!(suggestion.contains("BATON__"));
    }

    #[test]
    fn test_budget_message_and_transcript() {
        let error = Error::RecursionBudgetExceeded {
            agent: "coder".to_string(),
            limit: 3,
            transcript: vec![Turn::user("hi"), Turn::assistant("hello")],
        };

        assert!(error.user_message().contains("3 tool rounds"));
        assert_eq!(error.transcript().unwrap().len(), 2);

        let wrapped = Error::StageFailed {
            stage: "coder".to_string(),
            index: 1,
            source: Box::new(error),
        };
        assert_eq!(wrapped.transcript().unwrap().len(), 2);
        assert!(wrapped.user_message().contains("stage 2"));
        assert!(wrapped.suggestion().unwrap().contains("max_recursions"));
    }

    #[test]
    fn test_format_error_for_cli() {
        let error = Error::InvalidWorkflow("first agent must be master".to_string());

        let output = format_error_for_cli(&error);
        assert!(output.contains("first agent must be master"));
        assert!(output.contains("baton workflow validate"));
    }

    #[test]
    fn test_mcp_error_converts() {
        let error: Error = McpError::ServerNotFound("files".to_string()).into();
        assert!(matches!(error, Error::Transport(_)));
        assert!(error.to_string().contains("files"));
    }
}
