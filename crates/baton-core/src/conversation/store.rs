//! Conversation persistence
//!
//! Layout: `<root>/<provider-slug>/<name>.json`, one file per
//! (conversation, provider). Files are replaced wholesale on every write.

use super::convert::{convert_messages, decode_messages, encode_messages};
use super::format::{detect_format, is_compatible};
use crate::error::{Error, Result};
use baton_llm::{ProviderKind, Turn};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info};

/// A stored conversation file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationEntry {
    /// Conversation name
    pub name: String,
    /// Provider directory it lives in
    pub provider: ProviderKind,
    /// File path
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

/// File-backed conversation store
#[derive(Debug, Clone)]
pub struct ConversationStore {
    root: PathBuf,
}

impl ConversationStore {
    /// Create a store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding `name` for `provider`
    pub fn path_for(&self, name: &str, provider: ProviderKind) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self
            .root
            .join(provider.slug())
            .join(format!("{name}.json")))
    }

    /// Load a conversation for use with `provider`, converting it if needed
    ///
    /// The most recently written copy wins, with ties going to `provider`'s
    /// own file. A copy in an incompatible format is rewritten in place; a
    /// copy stored for another provider is migrated into `provider`'s
    /// directory. Missing conversations start empty.
    pub fn prepare(&self, name: &str, provider: ProviderKind) -> Result<Vec<Turn>> {
        let path = self.path_for(name, provider)?;
        let Some(source_provider) = self.latest(name, provider)? else {
            return Ok(Vec::new());
        };
        let source = self.path_for(name, source_provider)?;
        let data = fs::read(&source)?;
        let detected = detect_format(&data);

        if source_provider == provider {
            if is_compatible(detected, provider) {
                return Ok(decode_messages(&data, detect_or(&data, provider)));
            }
            let incompatible = Error::FormatIncompatible {
                detected,
                expected: provider,
            };
            debug!(conversation = %name, error = %incompatible, "Converting conversation in place");
        } else {
            info!(
                conversation = %name,
                from = %source_provider,
                to = %provider,
                "Migrating conversation to new provider"
            );
        }

        let from = detect_or(&data, source_provider);
        let converted = convert_messages(&data, from, provider);
        write_atomic(&path, &converted, Some(&source))?;
        Ok(decode_messages(&converted, provider))
    }

    /// Provider directory holding the newest copy of `name`
    ///
    /// Ties go to `preferred`. `None` when no copy exists.
    pub fn latest(&self, name: &str, preferred: ProviderKind) -> Result<Option<ProviderKind>> {
        let mut best: Option<(SystemTime, bool, ProviderKind)> = None;
        for candidate in ProviderKind::ALL.into_iter().chain([ProviderKind::Unknown]) {
            let path = self.path_for(name, candidate)?;
            let modified = match fs::metadata(&path) {
                Ok(metadata) => metadata.modified()?,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            let own = candidate == preferred;
            let newer = best
                .as_ref()
                .map_or(true, |(time, best_own, _)| (modified, own) > (*time, *best_own));
            if newer {
                best = Some((modified, own, candidate));
            }
        }
        Ok(best.map(|(_, _, provider)| provider))
    }

    /// Load a stored conversation as-is
    pub fn load(&self, name: &str, provider: ProviderKind) -> Result<Vec<Turn>> {
        let path = self.path_for(name, provider)?;
        match fs::read(&path) {
            Ok(data) => Ok(decode_messages(&data, detect_or(&data, provider))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Raw stored bytes
    pub fn load_raw(&self, name: &str, provider: ProviderKind) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(name, provider)?;
        match fs::read(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace a stored conversation
    pub fn save(&self, name: &str, provider: ProviderKind, turns: &[Turn]) -> Result<()> {
        let path = self.path_for(name, provider)?;
        let data = serde_json::to_vec_pretty(&encode_messages(turns, provider))?;
        let existing = path.exists().then_some(path.as_path());
        write_atomic(&path, &data, existing)?;
        debug!(conversation = %name, provider = %provider, turns = turns.len(), "Conversation saved");
        Ok(())
    }

    /// Write `name`'s `from` transcript in `to` format, returning the new path
    pub fn convert(&self, name: &str, from: ProviderKind, to: ProviderKind) -> Result<PathBuf> {
        let source = self.path_for(name, from)?;
        let data = fs::read(&source)?;
        let converted = convert_messages(&data, detect_or(&data, from), to);
        let target = self.path_for(name, to)?;
        write_atomic(&target, &converted, Some(&source))?;
        Ok(target)
    }

    /// Every stored conversation, sorted by name then provider
    pub fn list(&self) -> Result<Vec<ConversationEntry>> {
        let mut entries = Vec::new();
        let providers = match fs::read_dir(&self.root) {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(entries),
            Err(e) => return Err(e.into()),
        };

        for provider_dir in providers {
            let provider_dir = provider_dir?;
            if !provider_dir.file_type()?.is_dir() {
                continue;
            }
            let slug = provider_dir.file_name().to_string_lossy().to_string();
            let Ok(provider) = slug.parse::<ProviderKind>() else {
                continue;
            };

            for file in fs::read_dir(provider_dir.path())? {
                let file = file?;
                let path = file.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                entries.push(ConversationEntry {
                    name: name.to_string(),
                    provider,
                    size: file.metadata()?.len(),
                    path: path.clone(),
                });
            }
        }

        entries.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.provider.slug().cmp(b.provider.slug()))
        });
        Ok(entries)
    }

    /// Delete a conversation for one provider, or for all when `None`
    ///
    /// Returns the number of files removed.
    pub fn remove(&self, name: &str, provider: Option<ProviderKind>) -> Result<usize> {
        let providers: Vec<ProviderKind> = match provider {
            Some(p) => vec![p],
            None => ProviderKind::ALL
                .into_iter()
                .chain([ProviderKind::Unknown])
                .collect(),
        };

        let mut removed = 0;
        for provider in providers {
            let path = self.path_for(name, provider)?;
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(removed)
    }
}

fn detect_or(data: &[u8], fallback: ProviderKind) -> ProviderKind {
    match detect_format(data) {
        ProviderKind::Unknown => fallback,
        known => known,
    }
}

fn validate_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\'])
        || name.contains('\0');
    if bad {
        return Err(Error::InvalidConfig {
            field: "conversation".to_string(),
            message: format!("invalid conversation name '{name}'"),
        });
    }
    Ok(())
}

/// Write via a temp file and rename; copy permissions from `permissions_from`
fn write_atomic(path: &Path, data: &[u8], permissions_from: Option<&Path>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let permissions = match permissions_from {
        Some(source) => Some(fs::metadata(source)?.permissions()),
        None => None,
    };

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));
    fs::write(&tmp, data)?;
    if let Some(permissions) = permissions {
        fs::set_permissions(&tmp, permissions)?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}
