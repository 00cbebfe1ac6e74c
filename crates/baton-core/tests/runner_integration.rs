//! Runner Integration Tests
//!
//! Budgets and hand-offs driven through the public API with a scripted model

use baton_core::{AgentConfig, AgentOptions, AgentRunner, AppConfig, Error, FileConfigStore};
use baton_llm::{BackendOutcome, MessageRole, ModelConfig, ProviderKind, ScriptedBackend, ToolCall};
use baton_tools::{register_builtins, ToolRegistry};
use serde_json::json;
use std::sync::Arc;

fn store() -> Arc<FileConfigStore> {
    let mut config = AppConfig::default();
    config.models.insert(
        "fast".to_string(),
        ModelConfig::new(ProviderKind::OpenAiCompatible, "llama3"),
    );
    config.agents.insert(
        "planner".to_string(),
        AgentConfig::new("planner", "fast").with_tools(["*"]),
    );
    config.agents.insert(
        "researcher".to_string(),
        AgentConfig::new("researcher", "fast").with_tools(["state_get"]),
    );
    Arc::new(FileConfigStore::in_memory(config))
}

fn runner(backend: Arc<ScriptedBackend>) -> AgentRunner {
    let mut registry = ToolRegistry::new();
    register_builtins(&mut registry);
    AgentRunner::new(backend, store()).with_tools(Arc::new(registry))
}

fn tool_round() -> BackendOutcome {
    BackendOutcome::calls(vec![ToolCall::new(
        "call",
        "state_set",
        json!({"key": "progress", "value": 1}),
    )])
}

fn planner() -> AgentConfig {
    AgentConfig::new("planner", "fast").with_tools(["*"])
}

#[tokio::test]
async fn test_budget_of_three_aborts_on_fourth_attempt() {
    let backend = Arc::new(ScriptedBackend::new().with_fallback(tool_round()));

    let err = runner(backend.clone())
        .run(AgentOptions::new(planner().with_max_recursions(3), "loop forever"))
        .await
        .unwrap_err();

    assert_eq!(backend.step_count(), 4);
    match &err {
        Error::RecursionBudgetExceeded { agent, limit, transcript } => {
            assert_eq!(agent, "planner");
            assert_eq!(*limit, 3);
            assert_eq!(transcript[0].role, MessageRole::User);
            let rounds = transcript
                .iter()
                .filter(|t| t.role == MessageRole::Tool)
                .count();
            assert_eq!(rounds, 4);
        }
        other => panic!("expected RecursionBudgetExceeded, got {other:?}"),
    }
    assert_eq!(err.transcript().unwrap().len(), 9);
}

#[tokio::test]
async fn test_unlimited_budget_never_aborts() {
    let backend = Arc::new(ScriptedBackend::new());
    for _ in 0..25 {
        backend.push(tool_round());
    }
    backend.push(BackendOutcome::answer("done"));

    let outcome = runner(backend.clone())
        .run(AgentOptions::new(planner().with_max_recursions(-1), "keep going"))
        .await
        .unwrap();

    assert_eq!(outcome.text, "done");
    assert_eq!(outcome.turns, 26);
}

#[tokio::test]
async fn test_hand_off_runs_target_with_instruction() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.push(BackendOutcome::switch("researcher", "continue"));
    backend.push(BackendOutcome::answer("findings"));

    let outcome = runner(backend.clone())
        .run(AgentOptions::new(planner(), "plan a trip"))
        .await
        .unwrap();

    assert_eq!(outcome.agent, "researcher");
    assert_eq!(outcome.text, "findings");

    let requests = backend.requests();
    assert_eq!(requests[1].agent, "researcher");
    assert_eq!(requests[1].prompt, "continue");
    assert_eq!(requests[1].tools.len(), 1);
    assert_eq!(requests[1].tools[0].name, "state_get");
}

#[tokio::test]
async fn test_empty_instruction_ends_run() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.push(BackendOutcome::switch("researcher", ""));

    let outcome = runner(backend.clone())
        .run(AgentOptions::new(planner(), "plan a trip"))
        .await
        .unwrap();

    assert_eq!(outcome.agent, "planner");
    assert_eq!(backend.step_count(), 1);
}
