//! Canonical conversation turns
//!
//! Every provider wire format decodes into these types and encodes back out
//! of them. A turn is a role plus an ordered list of parts.

use crate::tools::ToolCall;
use serde::{Deserialize, Serialize};

/// Role in a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System message (instructions)
    System,
    /// User message
    User,
    /// Assistant message
    Assistant,
    /// Tool response
    Tool,
}

impl MessageRole {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One piece of a turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    /// Plain text
    Text {
        /// Text content
        text: String,
    },
    /// Model reasoning that some providers expose
    Thinking {
        /// Reasoning text
        text: String,
    },
    /// A tool invocation requested by the assistant
    ToolCall {
        /// Call identifier
        id: String,
        /// Tool name
        name: String,
        /// Arguments object
        arguments: serde_json::Value,
    },
    /// The outcome of a tool invocation
    ToolResult {
        /// Identifier of the call this answers
        call_id: String,
        /// Tool name
        name: String,
        /// Result content
        content: String,
        /// Whether the tool failed
        #[serde(default)]
        is_error: bool,
    },
}

impl Part {
    /// Create a text part
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create a tool result part
    #[must_use]
    pub fn tool_result(
        call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
        is_error: bool,
    ) -> Self {
        Self::ToolResult {
            call_id: call_id.into(),
            name: name.into(),
            content: content.into(),
            is_error,
        }
    }
}

impl From<ToolCall> for Part {
    fn from(call: ToolCall) -> Self {
        Self::ToolCall {
            id: call.id,
            name: call.name,
            arguments: call.arguments,
        }
    }
}

/// A turn in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Role of the turn's author
    pub role: MessageRole,
    /// Ordered parts
    pub parts: Vec<Part>,
}

impl Turn {
    /// Create a turn from parts
    #[must_use]
    pub fn new(role: MessageRole, parts: Vec<Part>) -> Self {
        Self { role, parts }
    }

    /// Create a system turn
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, vec![Part::text(content)])
    }

    /// Create a user turn
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, vec![Part::text(content)])
    }

    /// Create an assistant turn
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, vec![Part::text(content)])
    }

    /// Create an assistant turn carrying tool calls, with optional leading text
    #[must_use]
    pub fn assistant_with_calls(text: Option<String>, calls: Vec<ToolCall>) -> Self {
        let mut parts = Vec::with_capacity(calls.len() + 1);
        if let Some(text) = text.filter(|t| !t.is_empty()) {
            parts.push(Part::text(text));
        }
        parts.extend(calls.into_iter().map(Part::from));
        Self::new(MessageRole::Assistant, parts)
    }

    /// Create a tool turn from result parts
    #[must_use]
    pub fn tool_results(results: Vec<Part>) -> Self {
        Self::new(MessageRole::Tool, results)
    }

    /// Concatenated text parts (thinking excluded)
    #[must_use]
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Tool calls carried by this turn
    #[must_use]
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::ToolCall {
                    id,
                    name,
                    arguments,
                } => Some(ToolCall {
                    id: id.clone(),
                    name: name.clone(),
                    arguments: arguments.clone(),
                }),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_creation() {
        let system = Turn::system("You are a helpful assistant");
        assert_eq!(system.role, MessageRole::System);

        let user = Turn::user("Hello!");
        assert_eq!(user.role, MessageRole::User);
        assert_eq!(user.text(), "Hello!");

        let tool = Turn::tool_results(vec![Part::tool_result("call_1", "x", "ok", false)]);
        assert_eq!(tool.role, MessageRole::Tool);
    }

    #[test]
    fn test_message_role_as_str() {
        assert_eq!(MessageRole::System.as_str(), "system");
        assert_eq!(MessageRole::User.as_str(), "user");
        assert_eq!(MessageRole::Assistant.as_str(), "assistant");
        assert_eq!(MessageRole::Tool.as_str(), "tool");
    }

    #[test]
    fn test_assistant_with_calls_skips_empty_text() {
        let call = ToolCall::new("call_1", "file_read", serde_json::json!({"path": "a"}));
        let turn = Turn::assistant_with_calls(Some(String::new()), vec![call]);
        assert_eq!(turn.parts.len(), 1);
        assert_eq!(turn.tool_calls()[0].name, "file_read");
        assert!(turn.text().is_empty());
    }

    #[test]
    fn test_text_ignores_thinking() {
        let turn = Turn::new(
            MessageRole::Assistant,
            vec![
                Part::Thinking {
                    text: "hmm".to_string(),
                },
                Part::text("answer"),
            ],
        );
        assert_eq!(turn.text(), "answer");
    }
}
