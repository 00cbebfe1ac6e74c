//! Conversation CLI commands
//!
//! `baton convo` - List, show, convert and delete stored conversations

use super::ConvoCommands;
use crate::app::App;
use anyhow::{bail, Result};
use baton_core::conversation::detect_format;
use baton_llm::{MessageRole, Part, ProviderKind};

/// Run convo command
pub async fn run(app: &App, cmd: ConvoCommands) -> Result<()> {
    let store = app.conversations();
    match cmd {
        ConvoCommands::List => {
            let entries = store.list()?;
            if entries.is_empty() {
                println!("⚠️  No conversations in {}", store.root().display());
                return Ok(());
            }
            for entry in entries {
                println!("💬 {:<24} {:<18} {:>8} bytes", entry.name, entry.provider.slug(), entry.size);
            }
            Ok(())
        }
        ConvoCommands::Show { name, provider } => {
            let provider = match provider {
                Some(p) => p,
                None => match store.latest(&name, ProviderKind::Unknown)? {
                    Some(p) => p,
                    None => bail!("conversation '{name}' not found"),
                },
            };
            let turns = store.load(&name, provider)?;
            if turns.is_empty() {
                bail!("conversation '{name}' has no {provider} copy");
            }

            println!("💬 {name} ({provider}, {} turns)", turns.len());
            for turn in &turns {
                println!();
                print_turn(turn.role, &turn.parts);
            }
            Ok(())
        }
        ConvoCommands::Convert { name, from, to } => {
            let target = store.convert(&name, from, to)?;
            let data = std::fs::read(&target)?;
            println!(
                "✅ Converted '{name}' from {from} to {to} → {} (detected as {})",
                target.display(),
                detect_format(&data)
            );
            Ok(())
        }
        ConvoCommands::Rm { name, provider } => {
            let removed = store.remove(&name, provider)?;
            if removed == 0 {
                println!("⚠️  Nothing to remove for '{name}'");
            } else {
                println!("✅ Removed {removed} file(s) for '{name}'");
            }
            Ok(())
        }
    }
}

fn print_turn(role: MessageRole, parts: &[Part]) {
    println!("[{}]", role.as_str());
    for part in parts {
        match part {
            Part::Text { text } => println!("{text}"),
            Part::Thinking { text } => println!("(thinking) {text}"),
            Part::ToolCall {
                name, arguments, ..
            } => println!("🔧 {name}({arguments})"),
            Part::ToolResult {
                name,
                content,
                is_error,
                ..
            } => {
                let marker = if *is_error { "❌" } else { "↩" };
                println!("{marker} {name}: {content}");
            }
        }
    }
}
