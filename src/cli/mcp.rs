//! MCP CLI commands
//!
//! `baton mcp` - Inspect and edit the MCP server manifest

use super::McpCommands;
use crate::app::{load_manifest, App};
use anyhow::{bail, Context, Result};
use baton_core::Error;
use baton_tools::mcp::{InitOptions, McpManifest, ServerCatalogEntry};
use std::path::Path;

/// Run mcp command
pub async fn run(app: &App, cmd: McpCommands) -> Result<()> {
    let manifest_path = app.config.mcp.manifest.as_path();
    match cmd {
        McpCommands::List { all } => list(app, all).await,
        McpCommands::Import { file, overwrite } => {
            let incoming = load_manifest(&file)?;
            let mut manifest = app.manifest()?;
            let imported = manifest.import(incoming, overwrite);
            save(&manifest, manifest_path)?;
            if imported.is_empty() {
                println!("⚠️  Nothing imported (use --overwrite to replace existing servers)");
            } else {
                println!("✅ Imported: {}", imported.join(", "));
            }
            Ok(())
        }
        McpCommands::Export { file, servers } => {
            let manifest = app.manifest()?;
            if let Some(missing) = servers.iter().find(|s| !manifest.mcp_servers.contains_key(*s)) {
                bail!("MCP server '{missing}' is not in {}", manifest_path.display());
            }
            let exported = manifest.export(&servers);
            save(&exported, &file)?;
            println!(
                "✅ Exported {} servers to {}",
                exported.mcp_servers.len(),
                file.display()
            );
            Ok(())
        }
        McpCommands::Allow { name } => set_allowed(app, &name, true),
        McpCommands::Block { name } => set_allowed(app, &name, false),
    }
}

fn save(manifest: &McpManifest, path: &Path) -> Result<()> {
    manifest
        .save(path)
        .with_context(|| format!("Failed to write MCP manifest {}", path.display()))
}

fn set_allowed(app: &App, name: &str, allowed: bool) -> Result<()> {
    let mut manifest = app.manifest()?;
    if !manifest.set_allowed(name, allowed) {
        bail!(
            "MCP server '{name}' is not in {}",
            app.config.mcp.manifest.display()
        );
    }
    save(&manifest, &app.config.mcp.manifest)?;
    let verb = if allowed { "allowed" } else { "blocked" };
    println!("✅ MCP server '{name}' {verb}");
    Ok(())
}

async fn list(app: &App, all: bool) -> Result<()> {
    // Independent of any run: blocked servers are visible with --all
    let client = app.mcp_client()?;
    if client.configs().is_empty() {
        println!(
            "⚠️  No MCP servers in {}",
            app.config.mcp.manifest.display()
        );
        return Ok(());
    }

    let options = if all {
        InitOptions::all()
    } else {
        InitOptions::default()
    };
    let init = client.init(options).await.map_err(Error::from);
    let servers = client.get_all_servers().await;
    client.close().await;
    init?;

    for server in servers.iter().filter(|s| all || s.allowed) {
        print_server(server);
    }
    Ok(())
}

fn print_server(server: &ServerCatalogEntry) {
    let status = match (server.reachable, server.allowed) {
        (true, _) => "🟢",
        (false, true) => "🔴",
        (false, false) => "⛔",
    };
    println!("{status} {} ({})", server.name, server.transport);
    if !server.allowed {
        println!("   blocked");
    }
    if let Some(error) = &server.error {
        println!("   error: {error}");
    }
    for tool in &server.tools {
        if tool.description.is_empty() {
            println!("   🔧 {}", tool.name);
        } else {
            println!("   🔧 {} - {}", tool.name, tool.description);
        }
    }
    if !server.resources.is_empty() {
        println!("   📄 {} resources", server.resources.len());
    }
    if !server.prompts.is_empty() {
        println!("   💬 {} prompts", server.prompts.len());
    }
}
