//! Run CLI command
//!
//! `baton run` - Run one agent on a prompt

use crate::app::App;
use anyhow::Result;
use baton_core::{AgentOptions, ConfigStore, Error, RunOutcome};
use baton_llm::Capability;
use baton_tools::mcp::InitOptions;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Arguments for `baton run`
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Prompt text; `@template:NAME`, `@convo:NAME` and `@PATH` are expanded
    pub prompt: String,
    /// Agent to run
    #[arg(short, long)]
    pub agent: String,
    /// File to attach (repeatable)
    #[arg(short = 'f', long = "file")]
    pub files: Vec<PathBuf>,
    /// Conversation to continue and save to
    #[arg(long)]
    pub convo: Option<String>,
    /// Echo the effective prompt instead of calling a model; skips MCP
    #[arg(long)]
    pub dry_run: bool,
    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run `baton run`
pub async fn run(app: &App, args: RunArgs) -> Result<()> {
    let agent = app
        .store
        .get_agent(&args.agent)
        .await?
        .ok_or_else(|| Error::Configuration(format!("agent '{}' not found", args.agent)))?;

    let mcp = if agent.has_capability(Capability::Mcp) && !args.dry_run {
        let client = Arc::new(app.mcp_client()?);
        client.init(InitOptions::default()).await.map_err(Error::from)?;
        Some(client)
    } else {
        None
    };

    let runner = app.runner(app.backend(args.dry_run), mcp.clone());
    let cancel = runner.cancellation_token();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling run");
            cancel.cancel();
        }
    });

    let mut options = AgentOptions::new(agent, args.prompt).with_files(args.files);
    if let Some(convo) = args.convo {
        options = options.with_conversation(convo);
    }
    let result = runner.run(options).await;

    ctrl_c.abort();
    if let Some(client) = mcp {
        client.close().await;
        info!("MCP connections closed");
    }

    print_outcome(&result?, args.json)
}

fn print_outcome(outcome: &RunOutcome, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    } else {
        println!("{}", outcome.text);
    }
    Ok(())
}
