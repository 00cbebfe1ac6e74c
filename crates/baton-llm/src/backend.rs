//! Model Backend seam
//!
//! The agent loop never calls a vendor directly. It builds a
//! [`BackendRequest`], hands it to a [`ModelBackend`], and pattern-matches the
//! returned [`BackendOutcome`].

use crate::error::Result;
use crate::message::Turn;
use crate::model::{ModelConfig, SearchEngineConfig, ThinkLevel};
use crate::shared_state::SharedState;
use crate::tools::{ToolCall, ToolDefinition};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Optional agent features
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// Expose MCP server tools
    Mcp,
    /// Report token usage
    Usage,
    /// Render answers as markdown
    Markdown,
    /// Allow web search
    Search,
    /// Accept file attachments
    Attachments,
}

impl Capability {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mcp => "mcp",
            Self::Usage => "usage",
            Self::Markdown => "markdown",
            Self::Search => "search",
            Self::Attachments => "attachments",
        }
    }
}

/// A file loaded for the model
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    /// Source path
    pub path: PathBuf,
    /// File name
    pub name: String,
    /// MIME type from the extension
    pub mime_type: String,
    /// Raw bytes
    pub data: Vec<u8>,
}

impl Attachment {
    /// Build an attachment from a path and its bytes
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, data: Vec<u8>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime_type = mime_for_path(&path).to_string();
        Self {
            path,
            name,
            mime_type,
            data,
        }
    }

    /// Whether the content is textual
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.mime_type.starts_with("text/") || self.mime_type == "application/json"
    }
}

/// MIME type by file extension
#[must_use]
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "txt" | "log" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "toml" | "yaml" | "yml" | "rs" | "py" | "js" | "ts" | "go" | "sh" => "text/plain",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        _ => "application/octet-stream",
    }
}

/// Everything the backend needs for one step
#[derive(Debug, Clone)]
pub struct BackendRequest {
    /// Active agent name
    pub agent: String,
    /// Effective prompt for this step
    pub prompt: String,
    /// Conversation so far, ending with the latest user or tool turn
    pub transcript: Vec<Turn>,
    /// Resolved system prompt content
    pub system_prompt: Option<String>,
    /// Loaded attachments
    pub attachments: Vec<Attachment>,
    /// Model settings
    pub model: ModelConfig,
    /// Search engine, when the agent uses one
    pub search: Option<SearchEngineConfig>,
    /// Recursion budget (`-1` = unlimited)
    pub max_recursions: i32,
    /// Reasoning effort
    pub think: ThinkLevel,
    /// Tools the model may call
    pub tools: Vec<ToolDefinition>,
    /// Enabled capabilities
    pub capabilities: Vec<Capability>,
    /// Reachable MCP servers
    pub mcp_servers: Vec<String>,
    /// Blackboard of the invocation
    pub shared_state: SharedState,
}

impl BackendRequest {
    /// Whether a capability is enabled
    #[must_use]
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// Request to hand the conversation to another agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchAgentSignal {
    /// Agent to continue with
    pub target: String,
    /// Prompt for the target; empty ends the run
    pub instruction: String,
}

impl SwitchAgentSignal {
    /// Create a new hand-off signal
    #[must_use]
    pub fn new(target: impl Into<String>, instruction: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            instruction: instruction.into(),
        }
    }
}

/// Result of one backend step
#[derive(Debug, Clone, PartialEq)]
pub enum BackendOutcome {
    /// The model answered
    FinalAnswer {
        /// Answer text
        text: String,
        /// Reasoning, when exposed
        thinking: Option<String>,
    },
    /// The model wants tools run
    ToolCalls {
        /// Text emitted alongside the calls
        text: Option<String>,
        /// Requested calls
        calls: Vec<ToolCall>,
    },
    /// The model hands off to another agent
    SwitchAgent(SwitchAgentSignal),
}

impl BackendOutcome {
    /// Final answer without reasoning
    #[must_use]
    pub fn answer(text: impl Into<String>) -> Self {
        Self::FinalAnswer {
            text: text.into(),
            thinking: None,
        }
    }

    /// Tool calls without text
    #[must_use]
    pub fn calls(calls: Vec<ToolCall>) -> Self {
        Self::ToolCalls { text: None, calls }
    }

    /// Hand-off
    #[must_use]
    pub fn switch(target: impl Into<String>, instruction: impl Into<String>) -> Self {
        Self::SwitchAgent(SwitchAgentSignal::new(target, instruction))
    }
}

/// A model backend
#[async_trait::async_trait]
pub trait ModelBackend: Send + Sync {
    /// Backend name
    fn name(&self) -> &str;

    /// Run one model step
    async fn step(&self, request: BackendRequest) -> Result<BackendOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_mime() {
        let a = Attachment::new("notes/plan.md", b"# Plan".to_vec());
        assert_eq!(a.name, "plan.md");
        assert_eq!(a.mime_type, "text/markdown");
        assert!(a.is_text());

        let b = Attachment::new("img/photo.JPG", vec![0xff, 0xd8]);
        assert_eq!(b.mime_type, "image/jpeg");
        assert!(!b.is_text());

        let c = Attachment::new("blob", vec![]);
        assert_eq!(c.mime_type, "application/octet-stream");
    }

    #[test]
    fn test_capability_serde() {
        let caps: Vec<Capability> = serde_json::from_str(r#"["mcp","attachments"]"#).unwrap();
        assert_eq!(caps, vec![Capability::Mcp, Capability::Attachments]);
        assert_eq!(Capability::Search.as_str(), "search");
    }

    #[test]
    fn test_outcome_helpers() {
        assert!(matches!(
            BackendOutcome::answer("done"),
            BackendOutcome::FinalAnswer { ref text, .. } if text == "done"
        ));
        assert!(matches!(
            BackendOutcome::switch("researcher", "continue"),
            BackendOutcome::SwitchAgent(ref s) if s.target == "researcher"
        ));
    }
}
