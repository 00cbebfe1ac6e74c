//! MCP Client
//!
//! High-level client for managing multiple MCP server connections.

use super::protocol::{
    initialize_params, McpError, McpInitResult, McpPrompt, McpResource, McpResult, McpTool,
    McpToolResult,
};
use super::transport::{Connector, McpServerConfig, McpSession, TransportConnector};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Default per-server budget for connecting and listing
pub const DEFAULT_INIT_TIMEOUT: Duration = Duration::from_secs(30);

/// What `init` connects to and discovers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitOptions {
    /// Also connect to servers that are not allowed
    pub load_all: bool,
    /// Discover tools
    pub load_tools: bool,
    /// Discover resources
    pub load_resources: bool,
    /// Discover prompts
    pub load_prompts: bool,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            load_all: false,
            load_tools: true,
            load_resources: true,
            load_prompts: true,
        }
    }
}

impl InitOptions {
    /// Connect to every configured server, allowed or not
    #[must_use]
    pub fn all() -> Self {
        Self {
            load_all: true,
            ..Self::default()
        }
    }

    /// Only discover tools
    #[must_use]
    pub fn tools_only() -> Self {
        Self {
            load_resources: false,
            load_prompts: false,
            ..Self::default()
        }
    }
}

/// Snapshot of one server as the client sees it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerCatalogEntry {
    /// Server name
    pub name: String,
    /// Transport kind
    pub transport: String,
    /// Allow flag from configuration
    pub allowed: bool,
    /// Whether a live connection exists
    pub reachable: bool,
    /// Why the server is not reachable
    pub error: Option<String>,
    /// Discovered tools
    pub tools: Vec<McpTool>,
    /// Discovered resources
    pub resources: Vec<McpResource>,
    /// Discovered prompts
    pub prompts: Vec<McpPrompt>,
}

impl ServerCatalogEntry {
    fn pending(config: &McpServerConfig) -> Self {
        Self {
            name: config.name.clone(),
            transport: config.transport.kind().to_string(),
            allowed: config.allowed,
            reachable: false,
            error: None,
            tools: Vec::new(),
            resources: Vec::new(),
            prompts: Vec::new(),
        }
    }
}

#[derive(Default)]
struct ClientState {
    sessions: HashMap<String, Arc<dyn McpSession>>,
    catalog: BTreeMap<String, ServerCatalogEntry>,
}

struct Discovery {
    session: Arc<dyn McpSession>,
    tools: Vec<McpTool>,
    resources: Vec<McpResource>,
    prompts: Vec<McpPrompt>,
}

/// MCP client for managing multiple server connections
pub struct McpClient {
    configs: Vec<McpServerConfig>,
    connector: Arc<dyn Connector>,
    timeout: Duration,
    state: RwLock<ClientState>,
}

impl McpClient {
    /// Create a client over the real transports
    #[must_use]
    pub fn new(configs: Vec<McpServerConfig>) -> Self {
        Self::with_connector(configs, Arc::new(TransportConnector::new()))
    }

    /// Create a client with a custom connector
    #[must_use]
    pub fn with_connector(configs: Vec<McpServerConfig>, connector: Arc<dyn Connector>) -> Self {
        let catalog = configs
            .iter()
            .map(|c| (c.name.clone(), ServerCatalogEntry::pending(c)))
            .collect();
        Self {
            configs,
            connector,
            timeout: DEFAULT_INIT_TIMEOUT,
            state: RwLock::new(ClientState {
                sessions: HashMap::new(),
                catalog,
            }),
        }
    }

    /// Set the per-server timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configured servers
    #[must_use]
    pub fn configs(&self) -> &[McpServerConfig] {
        &self.configs
    }

    /// Connect to servers and discover their catalogs
    ///
    /// Each server runs in its own task under its own timeout. A failing
    /// server is recorded as unreachable; `init` itself does not fail on
    /// its account.
    pub async fn init(&self, options: InitOptions) -> McpResult<()> {
        self.close().await;

        let mut tasks = JoinSet::new();
        for config in &self.configs {
            if !config.allowed && !options.load_all {
                debug!(server = %config.name, "MCP server not allowed, skipping");
                continue;
            }
            let connector = Arc::clone(&self.connector);
            let config = config.clone();
            let timeout = self.timeout;
            tasks.spawn(async move {
                let result = tokio::time::timeout(
                    timeout,
                    discover(connector.as_ref(), &config, timeout, options),
                )
                .await
                .unwrap_or(Err(McpError::Timeout(timeout)));
                (config.name, result)
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => warn!(error = %e, "MCP init task failed"),
            }
        }

        let mut guard = self.state.write().await;
        let state = &mut *guard;
        for (name, result) in results {
            let Some(entry) = state.catalog.get_mut(&name) else {
                continue;
            };
            match result {
                Ok(found) => {
                    info!(
                        server = %name,
                        tools = found.tools.len(),
                        resources = found.resources.len(),
                        prompts = found.prompts.len(),
                        "MCP server initialized"
                    );
                    entry.reachable = true;
                    entry.error = None;
                    entry.tools = found.tools;
                    entry.resources = found.resources;
                    entry.prompts = found.prompts;
                    state.sessions.insert(name, found.session);
                }
                Err(e) => {
                    warn!(server = %name, error = %e, "MCP server unreachable (continuing without it)");
                    entry.reachable = false;
                    entry.error = Some(e.to_string());
                }
            }
        }

        warn_on_collisions(&state.catalog);
        Ok(())
    }

    /// Snapshot of every configured server
    pub async fn get_all_servers(&self) -> Vec<ServerCatalogEntry> {
        self.state.read().await.catalog.values().cloned().collect()
    }

    /// Names of servers with a live connection
    pub async fn reachable_servers(&self) -> Vec<String> {
        self.state
            .read()
            .await
            .catalog
            .values()
            .filter(|e| e.reachable)
            .map(|e| e.name.clone())
            .collect()
    }

    /// Server owning a tool; the alphabetically first wins on collisions
    pub async fn find_tool_owner(&self, tool_name: &str) -> Option<String> {
        self.state
            .read()
            .await
            .catalog
            .values()
            .filter(|e| e.reachable)
            .find(|e| e.tools.iter().any(|t| t.name == tool_name))
            .map(|e| e.name.clone())
    }

    /// Model-facing definitions of every reachable tool, deduplicated by name
    pub async fn llm_tools(&self) -> Vec<baton_llm::ToolDefinition> {
        let state = self.state.read().await;
        let mut seen = std::collections::HashSet::new();
        state
            .catalog
            .values()
            .filter(|e| e.reachable)
            .flat_map(|e| e.tools.iter())
            .filter(|t| seen.insert(t.name.clone()))
            .map(McpTool::to_llm_tool)
            .collect()
    }

    async fn session(&self, server_name: &str) -> McpResult<Arc<dyn McpSession>> {
        self.state
            .read()
            .await
            .sessions
            .get(server_name)
            .cloned()
            .ok_or_else(|| McpError::ServerNotFound(server_name.to_string()))
    }

    /// Call a tool on a specific server
    pub async fn call_tool(
        &self,
        server_name: &str,
        tool_name: &str,
        arguments: serde_json::Value,
    ) -> McpResult<McpToolResult> {
        let session = self.session(server_name).await?;

        let known = self
            .state
            .read()
            .await
            .catalog
            .get(server_name)
            .is_some_and(|e| e.tools.iter().any(|t| t.name == tool_name));
        if !known {
            return Err(McpError::ToolNotFound(tool_name.to_string()));
        }

        debug!(server = %server_name, tool = %tool_name, "Calling MCP tool");
        let result = session
            .request(
                "tools/call",
                Some(serde_json::json!({
                    "name": tool_name,
                    "arguments": arguments
                })),
            )
            .await?;
        parse(result, "tool result")
    }

    /// Call a tool on whichever server owns it
    pub async fn call_tool_by_name(
        &self,
        tool_name: &str,
        arguments: serde_json::Value,
    ) -> McpResult<McpToolResult> {
        let owner = self
            .find_tool_owner(tool_name)
            .await
            .ok_or_else(|| McpError::ToolNotFound(tool_name.to_string()))?;
        self.call_tool(&owner, tool_name, arguments).await
    }

    /// Read a resource from a server
    pub async fn read_resource(
        &self,
        server_name: &str,
        uri: &str,
    ) -> McpResult<serde_json::Value> {
        let session = self.session(server_name).await?;
        session
            .request("resources/read", Some(serde_json::json!({ "uri": uri })))
            .await
    }

    /// Tear down every live connection; calling it again is a no-op
    pub async fn close(&self) {
        let sessions: Vec<(String, Arc<dyn McpSession>)> = {
            let mut state = self.state.write().await;
            for entry in state.catalog.values_mut() {
                entry.reachable = false;
            }
            state.sessions.drain().collect()
        };
        for (name, session) in sessions {
            session.close().await;
            debug!(server = %name, "MCP session closed");
        }
    }
}

async fn discover(
    connector: &dyn Connector,
    config: &McpServerConfig,
    timeout: Duration,
    options: InitOptions,
) -> McpResult<Discovery> {
    let session = connector.connect(config, timeout).await?;
    match handshake(session.as_ref(), config, options).await {
        Ok((tools, resources, prompts)) => Ok(Discovery {
            session,
            tools,
            resources,
            prompts,
        }),
        Err(e) => {
            session.close().await;
            Err(e)
        }
    }
}

async fn handshake(
    session: &dyn McpSession,
    config: &McpServerConfig,
    options: InitOptions,
) -> McpResult<(Vec<McpTool>, Vec<McpResource>, Vec<McpPrompt>)> {
    let init: McpInitResult = parse(
        session
            .request("initialize", Some(initialize_params()))
            .await?,
        "init result",
    )?;
    debug!(
        server = %config.name,
        protocol = %init.protocol_version,
        "MCP handshake complete"
    );
    session.notify("notifications/initialized", None).await?;

    let caps = &init.capabilities;
    let tools = if options.load_tools {
        list_all(session, "tools/list", "tools").await?
    } else {
        Vec::new()
    };
    let resources = if options.load_resources && caps.resources.is_some() {
        list_all(session, "resources/list", "resources").await?
    } else {
        Vec::new()
    };
    let prompts = if options.load_prompts && caps.prompts.is_some() {
        list_all(session, "prompts/list", "prompts").await?
    } else {
        Vec::new()
    };
    Ok((tools, resources, prompts))
}

/// Follow `nextCursor` until the listing is exhausted
async fn list_all<T: DeserializeOwned>(
    session: &dyn McpSession,
    method: &str,
    key: &str,
) -> McpResult<Vec<T>> {
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let params = cursor.as_ref().map(|c| serde_json::json!({ "cursor": c }));
        let mut page = session.request(method, params).await?;
        if let Some(list) = page.get_mut(key).map(serde_json::Value::take) {
            let batch: Vec<T> = parse(list, key)?;
            items.extend(batch);
        }
        cursor = page
            .get("nextCursor")
            .and_then(|c| c.as_str())
            .map(str::to_string);
        if cursor.is_none() {
            return Ok(items);
        }
    }
}

fn parse<T: DeserializeOwned>(value: serde_json::Value, what: &str) -> McpResult<T> {
    serde_json::from_value(value)
        .map_err(|e| McpError::Protocol(format!("Failed to parse {what}: {e}")))
}

fn warn_on_collisions(catalog: &BTreeMap<String, ServerCatalogEntry>) {
    let mut owners: HashMap<&str, &str> = HashMap::new();
    for entry in catalog.values().filter(|e| e.reachable) {
        for tool in &entry.tools {
            match owners.get(tool.name.as_str()) {
                Some(owner) => warn!(
                    tool = %tool.name,
                    kept = %owner,
                    shadowed = %entry.name,
                    "MCP tool name offered by more than one server"
                ),
                None => {
                    owners.insert(tool.name.as_str(), entry.name.as_str());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::McpTransport;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeSession {
        tools: Vec<&'static str>,
        closes: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl McpSession for FakeSession {
        async fn request(
            &self,
            method: &str,
            params: Option<serde_json::Value>,
        ) -> McpResult<serde_json::Value> {
            match method {
                "initialize" => Ok(serde_json::json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {"tools": {}, "resources": {}}
                })),
                "tools/list" => {
                    let tools: Vec<_> = self
                        .tools
                        .iter()
                        .map(|n| serde_json::json!({"name": n, "description": "fake"}))
                        .collect();
                    Ok(serde_json::json!({ "tools": tools }))
                }
                "resources/list" => Ok(serde_json::json!({
                    "resources": [{"uri": "mem://notes", "name": "notes"}]
                })),
                "tools/call" => {
                    let params = params.unwrap_or_default();
                    Ok(serde_json::json!({
                        "content": [{"type": "text", "text": format!("called {}", params["name"].as_str().unwrap_or(""))}]
                    }))
                }
                other => Err(McpError::Server {
                    code: -32601,
                    message: format!("no {other}"),
                }),
            }
        }

        async fn notify(&self, _method: &str, _params: Option<serde_json::Value>) -> McpResult<()> {
            Ok(())
        }

        async fn close(&self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct FakeConnector {
        closes: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl Connector for FakeConnector {
        async fn connect(
            &self,
            config: &McpServerConfig,
            _timeout: Duration,
        ) -> McpResult<Arc<dyn McpSession>> {
            let tools = match config.name.as_str() {
                "alpha" => vec!["search", "fetch"],
                "beta" => vec!["search", "summarize"],
                "down" => return Err(McpError::Transport("connection refused".to_string())),
                "hang" => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    vec![]
                }
                _ => vec![],
            };
            Ok(Arc::new(FakeSession {
                tools,
                closes: Arc::clone(&self.closes),
            }))
        }
    }

    fn server(name: &str, allowed: bool) -> McpServerConfig {
        McpServerConfig {
            name: name.to_string(),
            transport: McpTransport::Stdio {
                command: "fake".to_string(),
                args: vec![],
                env: BTreeMap::new(),
            },
            allowed,
        }
    }

    fn client(servers: Vec<McpServerConfig>) -> (McpClient, Arc<AtomicUsize>) {
        let closes = Arc::new(AtomicUsize::new(0));
        let connector = Arc::new(FakeConnector {
            closes: Arc::clone(&closes),
        });
        (
            McpClient::with_connector(servers, connector).with_timeout(Duration::from_millis(200)),
            closes,
        )
    }

    #[tokio::test]
    async fn test_init_isolates_failures() {
        let (client, _) = client(vec![
            server("alpha", true),
            server("down", true),
            server("hang", true),
        ]);
        client.init(InitOptions::default()).await.unwrap();

        let servers = client.get_all_servers().await;
        assert_eq!(servers.len(), 3);
        assert!(servers[0].reachable);
        assert_eq!(servers[0].tools.len(), 2);
        assert_eq!(servers[0].resources.len(), 1);
        assert!(!servers[1].reachable);
        assert!(servers[1].error.as_deref().unwrap().contains("refused"));
        assert!(!servers[2].reachable);
        assert!(servers[2].error.as_deref().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_blocked_servers_skipped_unless_load_all() {
        let (client, _) = client(vec![server("alpha", true), server("beta", false)]);
        client.init(InitOptions::default()).await.unwrap();
        assert_eq!(client.reachable_servers().await, vec!["alpha".to_string()]);

        client.init(InitOptions::all()).await.unwrap();
        assert_eq!(
            client.reachable_servers().await,
            vec!["alpha".to_string(), "beta".to_string()]
        );
        let servers = client.get_all_servers().await;
        assert!(!servers[1].allowed);
    }

    #[tokio::test]
    async fn test_tool_owner_and_collisions() {
        let (client, _) = client(vec![server("beta", true), server("alpha", true)]);
        client.init(InitOptions::tools_only()).await.unwrap();

        assert_eq!(client.find_tool_owner("search").await.as_deref(), Some("alpha"));
        assert_eq!(
            client.find_tool_owner("summarize").await.as_deref(),
            Some("beta")
        );
        assert!(client.find_tool_owner("missing").await.is_none());

        let names: Vec<String> = client.llm_tools().await.into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["search", "fetch", "summarize"]);
    }

    #[tokio::test]
    async fn test_call_tool() {
        let (client, _) = client(vec![server("alpha", true)]);
        client.init(InitOptions::default()).await.unwrap();

        let result = client
            .call_tool_by_name("fetch", serde_json::json!({"url": "x"}))
            .await
            .unwrap();
        assert_eq!(result.text(), "called fetch");

        assert!(matches!(
            client.call_tool("alpha", "nope", serde_json::json!({})).await,
            Err(McpError::ToolNotFound(_))
        ));
        assert!(matches!(
            client.call_tool("ghost", "fetch", serde_json::json!({})).await,
            Err(McpError::ServerNotFound(_))
        ));
        assert!(matches!(
            client.call_tool_by_name("nope", serde_json::json!({})).await,
            Err(McpError::ToolNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (client, closes) = client(vec![server("alpha", true), server("beta", true)]);
        client.init(InitOptions::default()).await.unwrap();

        client.close().await;
        client.close().await;
        assert_eq!(closes.load(Ordering::SeqCst), 2);
        assert!(client.reachable_servers().await.is_empty());
        assert!(matches!(
            client.call_tool("alpha", "fetch", serde_json::json!({})).await,
            Err(McpError::ServerNotFound(_))
        ));
    }
}
