//! Baton LLM - Model Backend Abstraction
//!
//! This crate holds everything the agent loop needs to talk to a model
//! without knowing which vendor sits behind it:
//! - Model: provider tags, model settings, search-engine settings
//! - Message: canonical conversation turns shared by every wire format
//! - Tools: tool definitions and tool calls exchanged with the model
//! - Backend: the `ModelBackend` trait and its tagged `BackendOutcome`
//! - Mock: scripted and echo backends for tests and dry runs

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod error;
pub mod message;
pub mod mock;
pub mod model;
pub mod shared_state;
pub mod tools;
pub mod util;

pub use backend::{
    Attachment, BackendOutcome, BackendRequest, Capability, ModelBackend, SwitchAgentSignal,
};
pub use error::{Error, Result};
pub use message::{MessageRole, Part, Turn};
pub use mock::{EchoBackend, ScriptedBackend};
pub use model::{ModelConfig, ProviderKind, SearchEngineConfig, ThinkLevel};
pub use shared_state::SharedState;
pub use tools::{ToolCall, ToolDefinition};
