//! CLI module for Baton
//!
//! Provides commands:
//! - `run`: Run one agent on a prompt
//! - `agent`: List and define agents
//! - `workflow`: Validate and run master/worker pipelines
//! - `mcp`: Inspect and edit the MCP server manifest
//! - `convo`: Manage stored conversations

use crate::app::App;
use crate::loader::config_path;
use baton_llm::{Capability, ProviderKind};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod agent;
pub mod convo;
pub mod mcp;
pub mod run;
pub mod workflow;

/// Baton CLI
#[derive(Parser, Debug)]
#[command(name = "baton")]
#[command(about = "Run, hand off, and chain LLM agents")]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to $BATON_CONFIG, then ~/.baton/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging when RUST_LOG is unset
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Config file this invocation reads
    pub fn config_path(&self) -> PathBuf {
        config_path(self.config.as_deref())
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run an agent on a prompt
    Run(run::RunArgs),
    /// Manage agent definitions
    #[command(subcommand)]
    Agent(AgentCommands),
    /// Validate or run a workflow
    #[command(subcommand)]
    Workflow(WorkflowCommands),
    /// Manage MCP servers
    #[command(subcommand)]
    Mcp(McpCommands),
    /// Manage stored conversations
    #[command(subcommand)]
    Convo(ConvoCommands),
}

#[derive(Subcommand, Debug)]
pub enum AgentCommands {
    /// List configured agents
    List,
    /// Add or replace an agent and save it to the config file
    Set {
        /// Agent name
        name: String,
        /// Model reference
        #[arg(long)]
        model: String,
        /// Allowed tool (repeatable, `*` for all)
        #[arg(long = "tool")]
        tools: Vec<String>,
        /// Capability to enable (repeatable)
        #[arg(long = "capability", value_enum)]
        capabilities: Vec<CapabilityArg>,
        /// System prompt reference
        #[arg(long)]
        system: Option<String>,
        /// Template reference
        #[arg(long)]
        template: Option<String>,
        /// Tool-round budget, -1 for unlimited
        #[arg(long, allow_hyphen_values = true)]
        max_recursions: Option<i32>,
    },
}

#[derive(Subcommand, Debug)]
pub enum WorkflowCommands {
    /// Check a workflow without running it
    Validate {
        /// Descriptor file (TOML or JSON); the config's [[workflow]] when omitted
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Run a workflow
    Run {
        /// Seed prompt for the master agent
        prompt: String,
        /// Descriptor file (TOML or JSON); the config's [[workflow]] when omitted
        #[arg(long)]
        file: Option<PathBuf>,
        /// Use the echo backend and skip MCP
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum McpCommands {
    /// Connect to servers and show their catalogs
    List {
        /// Include servers that are not allowed
        #[arg(long)]
        all: bool,
    },
    /// Merge servers from another manifest
    Import {
        /// Manifest to read
        file: PathBuf,
        /// Replace servers that already exist
        #[arg(long)]
        overwrite: bool,
    },
    /// Write servers to a new manifest
    Export {
        /// Manifest to write
        file: PathBuf,
        /// Server to export (repeatable); all when omitted
        #[arg(long = "server")]
        servers: Vec<String>,
    },
    /// Allow a server for agents
    Allow {
        /// Server name
        name: String,
    },
    /// Block a server for agents
    Block {
        /// Server name
        name: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConvoCommands {
    /// List stored conversations
    List,
    /// Print a conversation's turns
    Show {
        /// Conversation name
        name: String,
        /// Provider copy to read; the newest copy when omitted
        #[arg(long)]
        provider: Option<ProviderKind>,
    },
    /// Convert a stored conversation to another provider's format
    Convert {
        /// Conversation name
        name: String,
        /// Source format
        #[arg(long)]
        from: ProviderKind,
        /// Target format
        #[arg(long)]
        to: ProviderKind,
    },
    /// Delete a conversation
    Rm {
        /// Conversation name
        name: String,
        /// Only this provider's copy
        #[arg(long)]
        provider: Option<ProviderKind>,
    },
}

/// Agent capability as a CLI value
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityArg {
    /// Expose MCP server tools
    Mcp,
    /// Report token usage
    Usage,
    /// Render answers as markdown
    Markdown,
    /// Allow web search
    Search,
    /// Accept file attachments
    Attachments,
}

impl From<CapabilityArg> for Capability {
    fn from(arg: CapabilityArg) -> Self {
        match arg {
            CapabilityArg::Mcp => Capability::Mcp,
            CapabilityArg::Usage => Capability::Usage,
            CapabilityArg::Markdown => Capability::Markdown,
            CapabilityArg::Search => Capability::Search,
            CapabilityArg::Attachments => Capability::Attachments,
        }
    }
}

/// Run the CLI command
pub async fn run(cli: Cli, app: App) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Run(args)) => run::run(&app, args).await,
        Some(Commands::Agent(cmd)) => agent::run(&app, cmd).await,
        Some(Commands::Workflow(cmd)) => workflow::run(&app, cmd).await,
        Some(Commands::Mcp(cmd)) => mcp::run(&app, cmd).await,
        Some(Commands::Convo(cmd)) => convo::run(&app, cmd).await,
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        <Cli as clap::CommandFactory>::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let cli = Cli::parse_from([
            "baton", "run", "hello", "--agent", "coder", "--file", "a.txt", "--file", "b.txt",
        ]);
        match cli.command {
            Some(Commands::Run(args)) => {
                assert_eq!(args.prompt, "hello");
                assert_eq!(args.agent, "coder");
                assert_eq!(args.files.len(), 2);
                assert!(!args.dry_run);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_convo_convert() {
        let cli = Cli::parse_from([
            "baton", "convo", "convert", "trip", "--from", "anthropic", "--to", "openai",
        ]);
        match cli.command {
            Some(Commands::Convo(ConvoCommands::Convert { name, from, to })) => {
                assert_eq!(name, "trip");
                assert_eq!(from, ProviderKind::Anthropic);
                assert_eq!(to, ProviderKind::OpenAi);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_negative_budget() {
        let cli = Cli::parse_from([
            "baton", "agent", "set", "looper", "--model", "fast", "--max-recursions", "-1",
        ]);
        match cli.command {
            Some(Commands::Agent(AgentCommands::Set { max_recursions, .. })) => {
                assert_eq!(max_recursions, Some(-1));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
