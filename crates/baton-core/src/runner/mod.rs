//! Agent runner - the bounded turn loop
//!
//! Drives one agent (and whoever it hands off to) through model steps and
//! tool rounds until a final answer, a budget abort, or cancellation.
//!
//! # Module Structure
//!
//! - `config`: Run input (`AgentOptions`) and runner limits
//! - `types`: Run output (`RunOutcome`) and resolved agent context
//! - `core`: `AgentRunner` struct and builder methods
//! - `process`: Main loop
//! - `tool_execution`: Embedded and MCP tool dispatch
//! - `attachments`: Concurrent file loading

mod attachments;
mod config;
mod core;
mod process;
mod tool_execution;
mod types;


pub use config::AgentOptions;
pub use core::AgentRunner;
pub use types::RunOutcome;
