//! Configuration loading
//!
//! Handles loading configuration from embedded defaults, the user's config
//! file, and the environment.

use anyhow::{Context, Result};
use baton_core::config::default_config_path;
use baton_core::AppConfig;
use config::{Config, Environment, File, FileFormat};
use std::path::{Path, PathBuf};

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "BATON_CONFIG";

/// Config file location: `--config`, then `BATON_CONFIG`, then `~/.baton/config.toml`
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
        .unwrap_or_else(default_config_path)
}

/// Load configuration from files and environment
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let config = Config::builder()
        // 1. Embedded defaults (always available)
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        // 2. User file (optional)
        .add_source(
            File::from(path.to_path_buf())
                .format(FileFormat::Toml)
                .required(false),
        )
        // 3. Environment variables (highest priority), e.g. BATON__RUNNER__MAX_ATTACHMENTS
        .add_source(
            Environment::with_prefix("BATON")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .with_context(|| format!("Failed to build configuration from {}", path.display()))?;

    let app: AppConfig = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;
    Ok(app.normalize())
}
