//! Baton - Agent Runner CLI
//!
//! CLI entry point: loads `.env` and configuration, installs logging, and
//! dispatches the subcommand.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing::debug;

mod app;
mod cli;
mod loader;
mod logging;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = cli::Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: cli::Cli) -> Result<()> {
    let app = app::App::load(cli.config_path())?;
    let _guard = logging::init(&app.config.logging, cli.verbose)?;
    debug!(version = env!("CARGO_PKG_VERSION"), "Starting Baton");

    cli::run(cli, app).await
}

fn report(e: &anyhow::Error) {
    match e.downcast_ref::<baton_core::Error>() {
        Some(core) => {
            debug!(error = ?core, "Command failed");
            eprint!("{}", baton_core::format_error_for_cli(core));
        }
        None => eprintln!("❌ {e:#}"),
    }
}
