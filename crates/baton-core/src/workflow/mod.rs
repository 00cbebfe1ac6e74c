//! Workflows
//!
//! A linear pipeline of agents: the master consumes the seed prompt, each
//! worker reads the previous stage's output directory as attachments, and
//! every stage writes `<output>/<name>.md`.

mod orchestrator;
mod types;
mod validate;

pub use orchestrator::WorkflowOrchestrator;
pub use types::{
    load_workflow, parse_workflow, StageReport, WorkflowAgent, WorkflowReport, WorkflowRole,
};
pub use validate::validate;
