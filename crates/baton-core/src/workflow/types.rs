//! Workflow definitions and reports

use crate::agents::AgentConfig;
use crate::error::{Error, Result};
use baton_llm::{Capability, ThinkLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Position of an agent in the pipeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowRole {
    /// First stage; consumes the seed prompt
    Master,
    /// Every later stage
    #[default]
    Worker,
}

impl WorkflowRole {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Master => "master",
            Self::Worker => "worker",
        }
    }
}

/// One workflow stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowAgent {
    /// Unique stage name
    pub name: String,
    /// Master or worker
    #[serde(default)]
    pub role: WorkflowRole,
    /// Model reference
    pub model: String,
    /// Directory whose files become attachments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<PathBuf>,
    /// Directory receiving `<name>.md`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    /// Template reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// System prompt reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Enable embedded and MCP tools
    #[serde(default)]
    pub tools: bool,
    /// Search engine reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Report token usage
    #[serde(default)]
    pub usage: bool,
    /// Render markdown
    #[serde(default)]
    pub markdown: bool,
    /// Enable reasoning
    #[serde(default)]
    pub think: bool,
    /// Tool-round budget; the runner default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_recursions: Option<i32>,
}

impl WorkflowAgent {
    /// Master stage writing to `output`
    pub fn master(
        name: impl Into<String>,
        model: impl Into<String>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            role: WorkflowRole::Master,
            output: Some(output.into()),
            ..Self::base(name.into(), model.into())
        }
    }

    /// Worker stage reading `input` and writing to `output`
    pub fn worker(
        name: impl Into<String>,
        model: impl Into<String>,
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input: Some(input.into()),
            output: Some(output.into()),
            ..Self::base(name.into(), model.into())
        }
    }

    fn base(name: String, model: String) -> Self {
        Self {
            name,
            role: WorkflowRole::Worker,
            model,
            input: None,
            output: None,
            template: None,
            system: None,
            tools: false,
            search: None,
            usage: false,
            markdown: false,
            think: false,
            max_recursions: None,
        }
    }

    /// Agent definition this stage runs as
    pub fn to_agent_config(&self, default_max_recursions: i32) -> AgentConfig {
        let mut agent = AgentConfig::new(&self.name, &self.model)
            .with_max_recursions(self.max_recursions.unwrap_or(default_max_recursions))
            .with_think(ThinkLevel::from(self.think));

        if self.tools {
            agent = agent.with_tools(["*"]).with_capability(Capability::Mcp);
        }
        if self.input.is_some() {
            agent = agent.with_capability(Capability::Attachments);
        }
        if self.usage {
            agent = agent.with_capability(Capability::Usage);
        }
        if self.markdown {
            agent = agent.with_capability(Capability::Markdown);
        }
        if let Some(search) = &self.search {
            agent = agent.with_search(search).with_capability(Capability::Search);
        }
        if let Some(template) = &self.template {
            agent = agent.with_template(template);
        }
        if let Some(system) = &self.system {
            agent = agent.with_system_prompt(system);
        }
        agent
    }
}

/// Outcome of one stage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    /// Stage name
    pub name: String,
    /// Stage role
    pub role: WorkflowRole,
    /// File the stage wrote
    pub output_file: PathBuf,
    /// Files attached from the input directory
    pub attachments: usize,
    /// Model steps taken
    pub turns: usize,
    /// Final answer
    pub text: String,
    /// Wall-clock time of the stage
    pub duration_ms: u64,
}

/// Outcome of a workflow run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowReport {
    /// Run identifier, also attached to log lines
    pub id: Uuid,
    /// When the first stage started
    pub started_at: DateTime<Utc>,
    /// When the last stage finished
    pub finished_at: Option<DateTime<Utc>>,
    /// Completed stages, in order
    pub stages: Vec<StageReport>,
}

impl WorkflowReport {
    /// Empty report for a run starting now
    #[must_use]
    pub fn start() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            stages: Vec::new(),
        }
    }

    /// Answer of the last stage
    #[must_use]
    pub fn final_text(&self) -> Option<&str> {
        self.stages.last().map(|s| s.text.as_str())
    }
}

#[derive(Deserialize)]
struct Descriptor {
    #[serde(default, alias = "agents")]
    workflow: Vec<WorkflowAgent>,
}

/// Parse a workflow descriptor
///
/// JSON accepts a bare list or an object with a `workflow` (or `agents`)
/// list; TOML uses `[[workflow]]` (or `[[agents]]`) tables.
pub fn parse_workflow(content: &str, json: bool) -> Result<Vec<WorkflowAgent>> {
    if json {
        let value: serde_json::Value = serde_json::from_str(content)?;
        if value.is_array() {
            return Ok(serde_json::from_value(value)?);
        }
        let descriptor: Descriptor = serde_json::from_value(value)?;
        return Ok(descriptor.workflow);
    }

    let descriptor: Descriptor = toml::from_str(content)
        .map_err(|e| Error::InvalidWorkflow(format!("descriptor: {e}")))?;
    Ok(descriptor.workflow)
}

/// Load a descriptor file; `.json` files parse as JSON, anything else as TOML
pub fn load_workflow(path: &Path) -> Result<Vec<WorkflowAgent>> {
    let content = std::fs::read_to_string(path)?;
    let json = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    parse_workflow(&content, json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_agent_config() {
        let mut stage = WorkflowAgent::worker("writer", "fast", "out/plan", "out/draft");
        stage.tools = true;
        stage.think = true;
        stage.search = Some("web".to_string());
        stage.system = Some("editor".to_string());

        let agent = stage.to_agent_config(10);
        assert_eq!(agent.name, "writer");
        assert_eq!(agent.max_recursions, 10);
        assert!(agent.is_tool_allowed("file_write"));
        assert!(agent.has_capability(Capability::Mcp));
        assert!(agent.has_capability(Capability::Attachments));
        assert!(agent.has_capability(Capability::Search));
        assert!(!agent.has_capability(Capability::Usage));
        assert_eq!(agent.think, ThinkLevel::Medium);
        assert_eq!(agent.system_prompt.as_deref(), Some("editor"));

        stage.max_recursions = Some(-1);
        assert!(stage.to_agent_config(10).is_unlimited());
    }

    #[test]
    fn test_parse_json_forms() {
        let bare = r#"[{"name": "planner", "role": "master", "model": "fast", "output": "out"}]"#;
        let agents = parse_workflow(bare, true).unwrap();
        assert_eq!(agents[0].role, WorkflowRole::Master);

        let wrapped = r#"{"agents": [{"name": "w", "model": "fast", "input": "a", "output": "b"}]}"#;
        let agents = parse_workflow(wrapped, true).unwrap();
        assert_eq!(agents[0].role, WorkflowRole::Worker);
        assert_eq!(agents[0].input.as_deref(), Some(Path::new("a")));
    }

    #[test]
    fn test_parse_toml() {
        let content = r#"
[[workflow]]
name = "planner"
role = "master"
model = "fast"
output = "out/plan"
max_recursions = 5

[[workflow]]
name = "writer"
model = "fast"
input = "out/plan"
output = "out/draft"
markdown = true
"#;
        let agents = parse_workflow(content, false).unwrap();
        assert_eq!(agents.len(), 2);
        assert_eq!(agents[0].max_recursions, Some(5));
        assert!(agents[1].markdown);
    }

    #[test]
    fn test_parse_rejects_bad_role() {
        let content = "[[workflow]]\nname = \"x\"\nrole = \"boss\"\nmodel = \"m\"\n";
        assert!(matches!(
            parse_workflow(content, false),
            Err(Error::InvalidWorkflow(_))
        ));
    }
}
