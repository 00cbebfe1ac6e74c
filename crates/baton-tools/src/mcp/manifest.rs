//! MCP server manifest
//!
//! The manifest is the JSON file users share between tools:
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "files": { "command": "npx", "args": ["-y", "server-filesystem"] },
//!     "search": { "httpUrl": "https://example.com/mcp", "headers": {} }
//!   },
//!   "allowMCPServers": ["files"]
//! }
//! ```
//!
//! Fields this crate does not understand are kept as-is, so an import
//! followed by an export hands back what was imported.

use super::protocol::{McpError, McpResult};
use super::transport::{McpServerConfig, McpTransport};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// One `mcpServers` entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestServer {
    /// Explicit transport (`stdio`, `sse`, `http`)
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// SSE (or typed HTTP) URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Streamable HTTP URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_url: Option<String>,
    /// Command for stdio servers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Command arguments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    /// HTTP headers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    /// Child environment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,
    /// Explicit allow flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<bool>,
    /// Everything else, preserved verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ManifestServer {
    /// Resolve the transport, inferring it when `type` is absent
    pub fn transport(&self) -> McpResult<McpTransport> {
        let kind = match self.kind.as_deref() {
            Some(kind) => kind.to_ascii_lowercase(),
            None if self.command.is_some() => "stdio".to_string(),
            None if self.http_url.is_some() => "http".to_string(),
            None if self.url.is_some() => "sse".to_string(),
            None => {
                return Err(McpError::Manifest(
                    "entry has no command, url or httpUrl".to_string(),
                ))
            }
        };

        let missing = |field: &str| McpError::Manifest(format!("{kind} entry needs '{field}'"));
        match kind.as_str() {
            "stdio" => Ok(McpTransport::Stdio {
                command: self.command.clone().ok_or_else(|| missing("command"))?,
                args: self.args.clone().unwrap_or_default(),
                env: self.env.clone().unwrap_or_default(),
            }),
            "sse" => Ok(McpTransport::Sse {
                url: self
                    .url
                    .clone()
                    .or_else(|| self.http_url.clone())
                    .ok_or_else(|| missing("url"))?,
                headers: self.headers.clone().unwrap_or_default(),
            }),
            "http" | "streamable-http" | "streamablehttp" => Ok(McpTransport::Http {
                url: self
                    .http_url
                    .clone()
                    .or_else(|| self.url.clone())
                    .ok_or_else(|| missing("httpUrl"))?,
                headers: self.headers.clone().unwrap_or_default(),
            }),
            other => Err(McpError::Manifest(format!("unknown transport '{other}'"))),
        }
    }

    /// Entry describing an existing configuration
    #[must_use]
    pub fn from_config(config: &McpServerConfig) -> Self {
        let mut entry = Self {
            allowed: Some(config.allowed),
            ..Self::default()
        };
        match &config.transport {
            McpTransport::Stdio { command, args, env } => {
                entry.command = Some(command.clone());
                entry.args = non_empty_list(args);
                entry.env = non_empty_map(env);
            }
            McpTransport::Sse { url, headers } => {
                entry.url = Some(url.clone());
                entry.headers = non_empty_map(headers);
            }
            McpTransport::Http { url, headers } => {
                entry.http_url = Some(url.clone());
                entry.headers = non_empty_map(headers);
            }
        }
        entry
    }
}

fn non_empty_list(list: &[String]) -> Option<Vec<String>> {
    (!list.is_empty()).then(|| list.to_vec())
}

fn non_empty_map(map: &BTreeMap<String, String>) -> Option<BTreeMap<String, String>> {
    (!map.is_empty()).then(|| map.clone())
}

/// The whole manifest file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpManifest {
    /// Servers by name
    #[serde(default)]
    pub mcp_servers: BTreeMap<String, ManifestServer>,
    /// Names allowed when entries carry no flag of their own
    #[serde(
        default,
        rename = "allowMCPServers",
        skip_serializing_if = "Option::is_none"
    )]
    pub allow_mcp_servers: Option<Vec<String>>,
    /// Everything else, preserved verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl McpManifest {
    /// Parse manifest JSON
    pub fn parse(json: &str) -> McpResult<Self> {
        serde_json::from_str(json).map_err(|e| McpError::Manifest(e.to_string()))
    }

    /// Load from disk; a missing file is an empty manifest
    pub fn load(path: &Path) -> McpResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(json) => Self::parse(&json),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No MCP manifest, using empty one");
                Ok(Self::default())
            }
            Err(e) => Err(McpError::Manifest(format!("{}: {e}", path.display()))),
        }
    }

    /// Serialize as pretty JSON
    pub fn to_json(&self) -> McpResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| McpError::Manifest(e.to_string()))
    }

    /// Write to disk, creating parent directories
    pub fn save(&self, path: &Path) -> McpResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| McpError::Manifest(format!("{}: {e}", parent.display())))?;
        }
        std::fs::write(path, self.to_json()?)
            .map_err(|e| McpError::Manifest(format!("{}: {e}", path.display())))
    }

    /// Whether a server may be loaded for agents
    ///
    /// The entry's own flag wins; otherwise the allow list decides, and an
    /// absent allow list allows everything.
    #[must_use]
    pub fn is_allowed(&self, name: &str) -> bool {
        match self.mcp_servers.get(name).and_then(|s| s.allowed) {
            Some(flag) => flag,
            None => match &self.allow_mcp_servers {
                Some(list) if !list.is_empty() => list.iter().any(|n| n == name),
                _ => true,
            },
        }
    }

    /// Server configurations; malformed entries are skipped with a warning
    #[must_use]
    pub fn server_configs(&self) -> Vec<McpServerConfig> {
        self.mcp_servers
            .iter()
            .filter_map(|(name, entry)| match entry.transport() {
                Ok(transport) => Some(McpServerConfig {
                    name: name.clone(),
                    transport,
                    allowed: self.is_allowed(name),
                }),
                Err(e) => {
                    warn!(server = %name, error = %e, "Skipping MCP manifest entry");
                    None
                }
            })
            .collect()
    }

    /// Merge another manifest's servers into this one
    ///
    /// Existing names are kept unless `overwrite` is set. Returns the names
    /// that were added or replaced.
    pub fn import(&mut self, other: McpManifest, overwrite: bool) -> Vec<String> {
        let mut imported = Vec::new();
        for (name, entry) in other.mcp_servers {
            if self.mcp_servers.contains_key(&name) && !overwrite {
                debug!(server = %name, "Keeping existing MCP server entry");
                continue;
            }
            self.mcp_servers.insert(name.clone(), entry);
            imported.push(name);
        }
        if let Some(incoming) = other.allow_mcp_servers {
            let list = self.allow_mcp_servers.get_or_insert_with(Vec::new);
            for name in incoming {
                if !list.contains(&name) {
                    list.push(name);
                }
            }
        }
        for (key, value) in other.extra {
            self.extra.entry(key).or_insert(value);
        }
        imported
    }

    /// Manifest holding only the named servers (all when `names` is empty)
    #[must_use]
    pub fn export(&self, names: &[String]) -> McpManifest {
        let keep = |name: &str| names.is_empty() || names.iter().any(|n| n == name);
        McpManifest {
            mcp_servers: self
                .mcp_servers
                .iter()
                .filter(|(name, _)| keep(name))
                .map(|(name, entry)| (name.clone(), entry.clone()))
                .collect(),
            allow_mcp_servers: self.allow_mcp_servers.as_ref().map(|list| {
                list.iter().filter(|name| keep(name)).cloned().collect()
            }),
            extra: self.extra.clone(),
        }
    }

    /// Set an entry's allow flag; false when the server is unknown
    pub fn set_allowed(&mut self, name: &str, allowed: bool) -> bool {
        match self.mcp_servers.get_mut(name) {
            Some(entry) => {
                entry.allowed = Some(allowed);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "mcpServers": {
            "files": {
                "command": "npx",
                "args": ["-y", "server-filesystem"],
                "env": {"ROOT": "/tmp"},
                "trust": true
            },
            "search": {"httpUrl": "https://example.com/mcp", "timeout": 3000},
            "legacy": {"url": "https://example.com/sse", "allowed": false},
            "broken": {"description": "no transport"}
        },
        "allowMCPServers": ["files", "search"],
        "theme": "dark"
    }"#;

    #[test]
    fn test_infers_transports() {
        let manifest = McpManifest::parse(SAMPLE).unwrap();
        let configs = manifest.server_configs();

        let kinds: Vec<(&str, &str)> = configs
            .iter()
            .map(|c| (c.name.as_str(), c.transport.kind()))
            .collect();
        assert_eq!(
            kinds,
            vec![("files", "stdio"), ("legacy", "sse"), ("search", "http")]
        );
    }

    #[test]
    fn test_allowed_resolution() {
        let manifest = McpManifest::parse(SAMPLE).unwrap();
        assert!(manifest.is_allowed("files"));
        assert!(manifest.is_allowed("search"));
        assert!(!manifest.is_allowed("legacy"));

        let open = McpManifest::parse(r#"{"mcpServers": {"a": {"command": "x"}}}"#).unwrap();
        assert!(open.is_allowed("a"));
    }

    #[test]
    fn test_round_trip_preserves_unknown_fields() {
        let manifest = McpManifest::parse(SAMPLE).unwrap();
        let again = McpManifest::parse(&manifest.to_json().unwrap()).unwrap();
        assert_eq!(manifest, again);
        assert_eq!(again.extra["theme"], "dark");
        assert_eq!(again.mcp_servers["files"].extra["trust"], true);
        assert_eq!(again.mcp_servers["search"].extra["timeout"], 3000);
    }

    #[test]
    fn test_import_and_export() {
        let mut local = McpManifest::parse(r#"{"mcpServers": {"files": {"command": "old"}}}"#)
            .unwrap();
        let incoming = McpManifest::parse(SAMPLE).unwrap();

        let imported = local.import(incoming.clone(), false);
        assert!(!imported.contains(&"files".to_string()));
        assert_eq!(local.mcp_servers["files"].command.as_deref(), Some("old"));
        assert_eq!(local.extra["theme"], "dark");

        let replaced = local.import(incoming, true);
        assert!(replaced.contains(&"files".to_string()));
        assert_eq!(local.mcp_servers["files"].command.as_deref(), Some("npx"));

        let subset = local.export(&["search".to_string()]);
        assert_eq!(subset.mcp_servers.len(), 1);
        assert_eq!(subset.allow_mcp_servers, Some(vec!["search".to_string()]));
        assert_eq!(subset.mcp_servers["search"].extra["timeout"], 3000);
    }

    #[test]
    fn test_load_missing_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mcp/servers.json");
        assert_eq!(McpManifest::load(&path).unwrap(), McpManifest::default());

        let mut manifest = McpManifest::parse(SAMPLE).unwrap();
        assert!(manifest.set_allowed("legacy", true));
        assert!(!manifest.set_allowed("nope", true));
        manifest.save(&path).unwrap();

        let loaded = McpManifest::load(&path).unwrap();
        assert!(loaded.is_allowed("legacy"));
    }

    #[test]
    fn test_export_keeps_empty_collections() {
        let input = r#"{"mcpServers":{"s":{"command":"x","args":[],"headers":{},"env":{}}},"allowMCPServers":[]}"#;
        let manifest = McpManifest::parse(input).unwrap();

        let exported = manifest.export(&[]).to_json().unwrap();
        let expected: serde_json::Value = serde_json::from_str(input).unwrap();
        let actual: serde_json::Value = serde_json::from_str(&exported).unwrap();
        assert_eq!(actual, expected);

        assert!(manifest.is_allowed("s"));
        assert_eq!(manifest.server_configs()[0].transport.kind(), "stdio");
    }

    #[test]
    fn test_from_config_round_trip() {
        let config = McpServerConfig::new(
            "remote",
            McpTransport::Http {
                url: "https://example.com/mcp".to_string(),
                headers: BTreeMap::new(),
            },
        );
        let entry = ManifestServer::from_config(&config);
        assert_eq!(entry.transport().unwrap(), config.transport);
    }
}
