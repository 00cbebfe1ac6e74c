//! Agent CLI commands
//!
//! `baton agent` - List and define agents

use super::AgentCommands;
use crate::app::App;
use anyhow::Result;
use baton_core::{AgentConfig, ConfigStore, FileConfigStore};
use baton_llm::util::mask_api_key;

/// Run agent command
pub async fn run(app: &App, cmd: AgentCommands) -> Result<()> {
    match cmd {
        AgentCommands::List => list(app).await,
        AgentCommands::Set {
            name,
            model,
            tools,
            capabilities,
            system,
            template,
            max_recursions,
        } => {
            let mut agent = AgentConfig::new(&name, model).with_tools(tools);
            for capability in capabilities {
                agent = agent.with_capability(capability.into());
            }
            if let Some(system) = system {
                agent = agent.with_system_prompt(system);
            }
            if let Some(template) = template {
                agent = agent.with_template(template);
            }
            if let Some(limit) = max_recursions {
                agent = agent.with_max_recursions(limit);
            }

            if !app.config.models.contains_key(&agent.model) {
                println!("⚠️  Model '{}' is not configured yet", agent.model);
            }

            // Edit the file itself, not the merged view with defaults and env overrides
            let file = FileConfigStore::open(&app.config_path)?;
            file.set_agent(agent).await?;
            println!(
                "✅ Agent '{name}' saved to {}",
                app.config_path.display()
            );
            Ok(())
        }
    }
}

async fn list(app: &App) -> Result<()> {
    let names = app.store.list_agents().await?;
    if names.is_empty() {
        println!("⚠️  No agents configured in {}", app.config_path.display());
        println!();
        println!("  Add one with: baton agent set <name> --model <model>");
        return Ok(());
    }

    for name in names {
        let Some(agent) = app.store.get_agent(&name).await? else {
            continue;
        };
        let budget = if agent.is_unlimited() {
            "unlimited".to_string()
        } else {
            agent.max_recursions.to_string()
        };
        let tools: Vec<&str> = agent.tools.iter().map(String::as_str).collect();
        println!("🤖 {name}");
        println!("   model: {}  budget: {budget}", describe_model(app, &agent.model));
        if !tools.is_empty() {
            println!("   tools: {}", tools.join(", "));
        }
        if !agent.capabilities.is_empty() {
            let caps: Vec<&str> = agent.capabilities.iter().map(|c| c.as_str()).collect();
            println!("   capabilities: {}", caps.join(", "));
        }
    }
    Ok(())
}

fn describe_model(app: &App, reference: &str) -> String {
    let Some(model) = app.config.models.get(reference) else {
        return format!("{reference} (not configured)");
    };
    let key = model
        .resolved_api_key()
        .map_or_else(|| "no key".to_string(), |k| format!("key {}", mask_api_key(&k)));
    format!("{reference} ({} {}, {key})", model.provider, model.model)
}
