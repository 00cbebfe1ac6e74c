//! Workflow orchestrator
//!
//! Runs the stages strictly in order over one shared blackboard. A stage's
//! output file is the only thing the next stage sees, through its input
//! directory.

use super::types::{StageReport, WorkflowAgent, WorkflowReport, WorkflowRole};
use super::validate::validate;
use crate::error::{Error, Result};
use crate::runner::{AgentOptions, AgentRunner};
use baton_llm::SharedState;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Runs validated workflows on an [`AgentRunner`]
pub struct WorkflowOrchestrator {
    runner: Arc<AgentRunner>,
    base_dir: Option<PathBuf>,
}

impl WorkflowOrchestrator {
    /// Create an orchestrator on top of a runner
    pub fn new(runner: Arc<AgentRunner>) -> Self {
        Self {
            runner,
            base_dir: None,
        }
    }

    /// Resolve relative input and output directories against `dir`
    #[must_use]
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Validate the workflow against the runner's config store
    pub async fn validate(&self, agents: &[WorkflowAgent]) -> Result<()> {
        validate(agents, self.runner.config_store().as_ref()).await
    }

    /// Validate and run every stage, stopping at the first failure
    ///
    /// The blackboard lives for the whole run and is cleared afterwards,
    /// whether or not a stage failed.
    pub async fn execute(&self, agents: &[WorkflowAgent], seed: &str) -> Result<WorkflowReport> {
        self.validate(agents).await?;

        let shared_state = SharedState::new();
        let mut report = WorkflowReport::start();
        info!(workflow_id = %report.id, stages = agents.len(), "Starting workflow");

        for (index, stage) in agents.iter().enumerate() {
            match self.run_stage(index, agents.len(), stage, seed, &shared_state).await {
                Ok(stage_report) => report.stages.push(stage_report),
                Err(e) => {
                    warn!(workflow_id = %report.id, stage = %stage.name, index, error = %e, "Workflow stage failed");
                    shared_state.clear();
                    return Err(Error::StageFailed {
                        stage: stage.name.clone(),
                        index,
                        source: Box::new(e),
                    });
                }
            }
        }

        shared_state.clear();
        report.finished_at = Some(Utc::now());
        info!(workflow_id = %report.id, stages = report.stages.len(), "Workflow finished");
        Ok(report)
    }

    async fn run_stage(
        &self,
        index: usize,
        total: usize,
        stage: &WorkflowAgent,
        seed: &str,
        shared_state: &SharedState,
    ) -> Result<StageReport> {
        let files = match &stage.input {
            Some(input) => self.input_files(stage, &self.resolve(input)).await?,
            None => Vec::new(),
        };

        let prompt = match stage.role {
            WorkflowRole::Master => seed.to_string(),
            WorkflowRole::Worker => worker_instruction(stage, index, total, seed),
        };

        let started = Instant::now();
        let agent = stage.to_agent_config(self.runner.settings.default_max_recursions);
        let attachments = files.len();
        info!(stage = %stage.name, index, role = stage.role.as_str(), attachments, "Running stage");

        let outcome = self
            .runner
            .run(
                AgentOptions::new(agent, prompt)
                    .with_files(files)
                    .with_shared_state(shared_state.clone()),
            )
            .await?;

        let output_dir = stage
            .output
            .as_deref()
            .map(|dir| self.resolve(dir))
            .ok_or_else(|| Error::InvalidWorkflow(format!("'{}' has no output", stage.name)))?;
        tokio::fs::create_dir_all(&output_dir).await?;
        let output_file = output_dir.join(format!("{}.md", stage.name));
        tokio::fs::write(&output_file, outcome.text.as_bytes()).await?;

        info!(stage = %stage.name, file = %output_file.display(), "Stage output written");
        Ok(StageReport {
            name: stage.name.clone(),
            role: stage.role,
            output_file,
            attachments,
            turns: outcome.turns,
            text: outcome.text,
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }

    fn resolve(&self, dir: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if dir.is_relative() => base.join(dir),
            _ => dir.to_path_buf(),
        }
    }

    /// Regular files directly inside `dir`, sorted by name
    async fn input_files(&self, stage: &WorkflowAgent, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("input directory {} of '{}': {e}", dir.display(), stage.name),
            ))
        })?;

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();

        if files.is_empty() {
            warn!(stage = %stage.name, dir = %dir.display(), "Input directory is empty");
        }
        Ok(files)
    }
}

fn worker_instruction(stage: &WorkflowAgent, index: usize, total: usize, seed: &str) -> String {
    format!(
        "You are '{}', stage {} of {} in a workflow. The attached files are the previous \
         stage's output. Carry the work forward and reply with your result only.\n\n\
         Original task: {}",
        stage.name,
        index + 1,
        total,
        seed
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, FileConfigStore};
    use baton_llm::{BackendOutcome, ModelConfig, ProviderKind, ScriptedBackend};

    fn runner(backend: Arc<ScriptedBackend>) -> Arc<AgentRunner> {
        let mut config = AppConfig::default();
        config.models.insert(
            "fast".to_string(),
            ModelConfig::new(ProviderKind::OpenAi, "gpt-4o-mini"),
        );
        Arc::new(AgentRunner::new(
            backend,
            Arc::new(FileConfigStore::in_memory(config)),
        ))
    }

    fn pipeline() -> Vec<WorkflowAgent> {
        vec![
            WorkflowAgent::master("planner", "fast", "plan"),
            WorkflowAgent::worker("writer", "fast", "plan", "draft"),
        ]
    }

    #[tokio::test]
    async fn test_stages_chain_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(ScriptedBackend::new());
        backend.push(BackendOutcome::answer("1. intro\n2. body"));
        backend.push(BackendOutcome::answer("# Draft"));

        let orchestrator = WorkflowOrchestrator::new(runner(backend.clone())).with_base_dir(dir.path());
        let report = orchestrator.execute(&pipeline(), "write a post").await.unwrap();

        assert_eq!(report.stages.len(), 2);
        assert!(report.finished_at.is_some());
        assert_eq!(report.final_text(), Some("# Draft"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("plan/planner.md")).unwrap(),
            "1. intro\n2. body"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("draft/writer.md")).unwrap(),
            "# Draft"
        );

        let requests = backend.requests();
        assert_eq!(requests[0].prompt, "write a post");
        assert!(requests[0].attachments.is_empty());
        assert!(requests[1].prompt.contains("'writer', stage 2 of 2"));
        assert!(requests[1].prompt.contains("write a post"));
        assert_eq!(requests[1].attachments.len(), 1);
        assert_eq!(requests[1].attachments[0].name, "planner.md");
        assert_eq!(report.stages[1].attachments, 1);
    }

    #[tokio::test]
    async fn test_missing_input_fails_stage() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(ScriptedBackend::new());
        let mut agents = pipeline();
        agents[1].input = Some("nowhere".into());

        let err = WorkflowOrchestrator::new(runner(backend.clone()))
            .with_base_dir(dir.path())
            .execute(&agents, "seed")
            .await
            .unwrap_err();

        match err {
            Error::StageFailed { stage, index, source } => {
                assert_eq!(stage, "writer");
                assert_eq!(index, 1);
                assert!(matches!(*source, Error::Io(_)));
            }
            other => panic!("expected StageFailed, got {other:?}"),
        }
        assert_eq!(backend.step_count(), 1);
    }

    #[tokio::test]
    async fn test_blackboard_shared_and_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(ScriptedBackend::new());
        let orchestrator = WorkflowOrchestrator::new(runner(backend.clone())).with_base_dir(dir.path());
        orchestrator.execute(&pipeline(), "seed").await.unwrap();

        let requests = backend.requests();
        assert!(requests[0].shared_state.same_as(&requests[1].shared_state));
        assert!(requests[1].shared_state.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_workflow_runs_nothing() {
        let backend = Arc::new(ScriptedBackend::new());
        let err = WorkflowOrchestrator::new(runner(backend.clone()))
            .execute(&[], "seed")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidWorkflow(_)));
        assert_eq!(backend.step_count(), 0);
    }
}
