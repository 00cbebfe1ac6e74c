//! Workflow CLI commands
//!
//! `baton workflow` - Validate and run master/worker pipelines

use super::WorkflowCommands;
use crate::app::App;
use anyhow::{Context, Result};
use baton_core::workflow::{load_workflow, WorkflowAgent};
use baton_core::{Error, WorkflowOrchestrator};
use baton_tools::mcp::InitOptions;
use std::path::Path;
use std::sync::Arc;

/// Run workflow command
pub async fn run(app: &App, cmd: WorkflowCommands) -> Result<()> {
    match cmd {
        WorkflowCommands::Validate { file } => {
            let agents = load(app, file.as_deref())?;
            baton_core::workflow::validate(&agents, app.store.as_ref()).await?;
            println!("✅ Workflow is valid ({} stages)", agents.len());
            for (index, agent) in agents.iter().enumerate() {
                println!(
                    "   {}. {} [{}] model: {}",
                    index + 1,
                    agent.name,
                    agent.role.as_str(),
                    agent.model
                );
            }
            Ok(())
        }
        WorkflowCommands::Run {
            prompt,
            file,
            dry_run,
        } => execute(app, &prompt, file.as_deref(), dry_run).await,
    }
}

fn load(app: &App, file: Option<&Path>) -> Result<Vec<WorkflowAgent>> {
    match file {
        Some(path) => load_workflow(path)
            .with_context(|| format!("Failed to load workflow {}", path.display())),
        None => Ok(app.config.workflow.clone()),
    }
}

async fn execute(app: &App, prompt: &str, file: Option<&Path>, dry_run: bool) -> Result<()> {
    let agents = load(app, file)?;
    // Reject a bad pipeline before any MCP server process is spawned
    baton_core::workflow::validate(&agents, app.store.as_ref()).await?;

    let mcp = if agents.iter().any(|a| a.tools) && !dry_run {
        let client = Arc::new(app.mcp_client()?);
        client.init(InitOptions::default()).await.map_err(Error::from)?;
        Some(client)
    } else {
        None
    };

    let runner = Arc::new(app.runner(app.backend(dry_run), mcp.clone()));
    let result = WorkflowOrchestrator::new(runner).execute(&agents, prompt).await;

    if let Some(client) = mcp {
        client.close().await;
    }

    let report = result?;
    for stage in &report.stages {
        println!(
            "✅ {} → {} ({} steps, {} ms)",
            stage.name,
            stage.output_file.display(),
            stage.turns,
            stage.duration_ms
        );
    }
    if let Some(text) = report.final_text() {
        println!();
        println!("{text}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_workflow_rejected_before_mcp() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::load(dir.path().join("missing.toml")).unwrap();
        // Unreadable manifest: touching MCP at all would fail differently
        app.config.mcp.manifest = dir.path().to_path_buf();

        let mut planner = WorkflowAgent::master("planner", "fast", "plan");
        planner.tools = true;
        app.config.workflow = vec![planner.clone(), planner];

        let err = execute(&app, "seed", None, false).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::InvalidWorkflow(_))
        ));
    }
}
