//! Agents
//!
//! Named, validated agent definitions consumed by the runner.

mod config;

pub use config::{default_max_recursions, AgentConfig, UNLIMITED_RECURSIONS};
