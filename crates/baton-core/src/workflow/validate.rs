//! Workflow validation

use super::types::{WorkflowAgent, WorkflowRole};
use crate::config::ConfigStore;
use crate::error::{Error, Result};
use std::collections::HashSet;
use std::path::Path;

fn invalid(message: impl Into<String>) -> Error {
    Error::InvalidWorkflow(message.into())
}

fn is_blank(path: Option<&Path>) -> bool {
    path.map_or(true, |p| p.as_os_str().is_empty())
}

/// Check a workflow before anything runs
///
/// Rejects an empty list, duplicate names, a first stage that is not a master
/// with an output directory, masters past the first stage, workers without
/// both directories, and references to models or search engines the store
/// does not know.
pub async fn validate(agents: &[WorkflowAgent], store: &dyn ConfigStore) -> Result<()> {
    let Some(first) = agents.first() else {
        return Err(invalid("workflow has no agents"));
    };

    if first.role != WorkflowRole::Master {
        return Err(invalid(format!(
            "first agent '{}' must have role master",
            first.name
        )));
    }
    if is_blank(first.output.as_deref()) {
        return Err(invalid(format!(
            "master agent '{}' needs an output directory",
            first.name
        )));
    }

    let mut names = HashSet::new();
    for (index, agent) in agents.iter().enumerate() {
        if agent.name.trim().is_empty() {
            return Err(invalid(format!("agent {index} has no name")));
        }
        if !names.insert(agent.name.as_str()) {
            return Err(invalid(format!("duplicate agent name '{}'", agent.name)));
        }

        if index > 0 {
            if agent.role == WorkflowRole::Master {
                return Err(invalid(format!(
                    "only the first agent may be master, '{}' is stage {index}",
                    agent.name
                )));
            }
            if is_blank(agent.input.as_deref()) {
                return Err(invalid(format!(
                    "worker '{}' needs an input directory",
                    agent.name
                )));
            }
            if is_blank(agent.output.as_deref()) {
                return Err(invalid(format!(
                    "worker '{}' needs an output directory",
                    agent.name
                )));
            }
        }

        if let Some(limit) = agent.max_recursions {
            if limit == 0 || limit < -1 {
                return Err(invalid(format!(
                    "agent '{}' has max_recursions {limit}; use -1 or a positive number",
                    agent.name
                )));
            }
        }

        if store.get_model(&agent.model).await?.is_none() {
            return Err(invalid(format!(
                "agent '{}' references unknown model '{}'",
                agent.name, agent.model
            )));
        }
        if let Some(search) = &agent.search {
            if store.get_search_engine(search).await?.is_none() {
                return Err(invalid(format!(
                    "agent '{}' references unknown search engine '{search}'",
                    agent.name
                )));
            }
        }
    }

    Ok(())
}
