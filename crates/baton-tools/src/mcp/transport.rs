//! MCP Transport Layer
//!
//! Handles communication with MCP servers over different transports. Every
//! transport is exposed as an [`McpSession`]; a [`Connector`] opens them.

use super::http::{HttpSession, SseSession};
use super::protocol::{McpError, McpRequest, McpResponse, McpResult};
use baton_llm::util::expand_env;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// MCP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpServerConfig {
    /// Server name (unique identifier)
    pub name: String,
    /// Transport configuration
    pub transport: McpTransport,
    /// Whether the server may be loaded for agents
    #[serde(default = "default_true")]
    pub allowed: bool,
}

fn default_true() -> bool {
    true
}

impl McpServerConfig {
    /// Create an allowed server configuration
    #[must_use]
    pub fn new(name: impl Into<String>, transport: McpTransport) -> Self {
        Self {
            name: name.into(),
            transport,
            allowed: true,
        }
    }
}

/// MCP transport type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum McpTransport {
    /// Stdio transport (spawn process)
    Stdio {
        /// Command to run
        command: String,
        /// Command arguments
        #[serde(default)]
        args: Vec<String>,
        /// Environment variables
        #[serde(default)]
        env: BTreeMap<String, String>,
    },
    /// Legacy SSE transport (GET event stream, POST to announced endpoint)
    Sse {
        /// Event stream URL
        url: String,
        /// Extra request headers
        #[serde(default)]
        headers: BTreeMap<String, String>,
    },
    /// Streamable HTTP transport
    Http {
        /// Endpoint URL
        url: String,
        /// Extra request headers
        #[serde(default)]
        headers: BTreeMap<String, String>,
    },
}

impl McpTransport {
    /// Returns the string representation
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Stdio { .. } => "stdio",
            Self::Sse { .. } => "sse",
            Self::Http { .. } => "http",
        }
    }
}

/// A live connection to one MCP server
#[async_trait::async_trait]
pub trait McpSession: Send + Sync {
    /// Send a request and wait for its result
    async fn request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> McpResult<serde_json::Value>;

    /// Send a notification
    async fn notify(&self, method: &str, params: Option<serde_json::Value>) -> McpResult<()>;

    /// Tear the connection down; safe to call more than once
    async fn close(&self);
}

/// Opens sessions for server configurations
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    /// Connect to a server
    async fn connect(
        &self,
        config: &McpServerConfig,
        request_timeout: Duration,
    ) -> McpResult<Arc<dyn McpSession>>;
}

/// Connector for the real stdio, HTTP and SSE transports
#[derive(Debug, Clone, Default)]
pub struct TransportConnector {
    http: reqwest::Client,
}

impl TransportConnector {
    /// Create a connector with a fresh HTTP client
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Connector for TransportConnector {
    async fn connect(
        &self,
        config: &McpServerConfig,
        request_timeout: Duration,
    ) -> McpResult<Arc<dyn McpSession>> {
        match &config.transport {
            McpTransport::Stdio { command, args, env } => Ok(Arc::new(StdioSession::spawn(
                &config.name,
                command,
                args,
                env,
                request_timeout,
            )?)),
            McpTransport::Http { url, headers } => Ok(Arc::new(HttpSession::new(
                &config.name,
                self.http.clone(),
                url,
                headers,
                request_timeout,
            ))),
            McpTransport::Sse { url, headers } => Ok(Arc::new(
                SseSession::connect(
                    &config.name,
                    self.http.clone(),
                    url,
                    headers,
                    request_timeout,
                )
                .await?,
            )),
        }
    }
}

/// In-flight requests waiting for a reply on a shared channel
#[derive(Debug, Default, Clone)]
pub(crate) struct PendingRequests {
    inner: Arc<Mutex<HashMap<u64, oneshot::Sender<McpResponse>>>>,
    next_id: Arc<AtomicU64>,
}

impl PendingRequests {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::default(),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub(crate) fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    pub(crate) fn register(&self, id: u64) -> oneshot::Receiver<McpResponse> {
        let (tx, rx) = oneshot::channel();
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, tx);
        rx
    }

    pub(crate) fn forget(&self, id: u64) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id);
    }

    /// Route a reply to its waiter
    pub(crate) fn resolve(&self, response: McpResponse) {
        let Some(id) = response.id.filter(|_| response.is_reply()) else {
            return;
        };
        let sender = self
            .inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id);
        if let Some(sender) = sender {
            let _ = sender.send(response);
        }
    }

    /// Drop every waiter; their receivers observe a closed channel
    pub(crate) fn fail_all(&self) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    pub(crate) async fn wait(
        &self,
        server: &str,
        id: u64,
        rx: oneshot::Receiver<McpResponse>,
        timeout: Duration,
    ) -> McpResult<serde_json::Value> {
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(response)) => response.into_result(),
            Ok(Err(_)) => Err(McpError::Closed(server.to_string())),
            Err(_) => {
                self.forget(id);
                Err(McpError::Timeout(timeout))
            }
        }
    }
}

/// Session over a spawned child's stdin/stdout
pub struct StdioSession {
    name: String,
    pending: PendingRequests,
    stdin: tokio::sync::Mutex<Option<ChildStdin>>,
    child: tokio::sync::Mutex<Option<Child>>,
    request_timeout: Duration,
}

impl StdioSession {
    /// Spawn the server process
    pub fn spawn(
        name: &str,
        command: &str,
        args: &[String],
        env: &BTreeMap<String, String>,
        request_timeout: Duration,
    ) -> McpResult<Self> {
        info!(server = %name, command = %command, args = ?args, "Starting MCP server process");

        let mut cmd = Command::new(command);
        cmd.args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        for (key, value) in env {
            cmd.env(key, expand_env(value));
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| McpError::Transport(format!("Failed to spawn MCP server: {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::Transport("Failed to get stdin handle".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| McpError::Transport("Failed to get stdout handle".to_string()))?;

        if let Some(stderr) = child.stderr.take() {
            let server_name = name.to_string();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(server = %server_name, line = %line, "MCP server stderr");
                }
            });
        }

        let pending = PendingRequests::new();
        let reader_pending = pending.clone();
        let server_name = name.to_string();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) if line.trim().is_empty() => {}
                    Ok(Some(line)) => {
                        debug!(server = %server_name, line = %line, "Received from MCP server");
                        match serde_json::from_str::<McpResponse>(&line) {
                            Ok(response) => reader_pending.resolve(response),
                            Err(e) => {
                                warn!(server = %server_name, error = %e, "Failed to parse message");
                            }
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!(server = %server_name, error = %e, "Read error");
                        break;
                    }
                }
            }
            reader_pending.fail_all();
            debug!(server = %server_name, "MCP server reader exited");
        });

        Ok(Self {
            name: name.to_string(),
            pending,
            stdin: tokio::sync::Mutex::new(Some(stdin)),
            child: tokio::sync::Mutex::new(Some(child)),
            request_timeout,
        })
    }

    async fn write_line(&self, request: &McpRequest) -> McpResult<()> {
        let mut json = serde_json::to_string(request)
            .map_err(|e| McpError::Protocol(format!("Failed to serialize request: {e}")))?;
        json.push('\n');

        debug!(server = %self.name, method = %request.method, "Sending to MCP server");

        let mut guard = self.stdin.lock().await;
        let stdin = guard
            .as_mut()
            .ok_or_else(|| McpError::Closed(self.name.clone()))?;
        stdin
            .write_all(json.as_bytes())
            .await
            .map_err(|e| McpError::Transport(format!("Failed to write to stdin: {e}")))?;
        stdin
            .flush()
            .await
            .map_err(|e| McpError::Transport(format!("Failed to flush stdin: {e}")))
    }
}

#[async_trait::async_trait]
impl McpSession for StdioSession {
    async fn request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> McpResult<serde_json::Value> {
        let id = self.pending.next_id();
        let rx = self.pending.register(id);
        let request = McpRequest::new(method, id).with_params(params);
        if let Err(e) = self.write_line(&request).await {
            self.pending.forget(id);
            return Err(e);
        }
        self.pending
            .wait(&self.name, id, rx, self.request_timeout)
            .await
    }

    async fn notify(&self, method: &str, params: Option<serde_json::Value>) -> McpResult<()> {
        self.write_line(&McpRequest::notification(method).with_params(params))
            .await
    }

    async fn close(&self) {
        self.stdin.lock().await.take();
        if let Some(mut child) = self.child.lock().await.take() {
            let _ = child.kill().await;
            info!(server = %self.name, "MCP server process stopped");
        }
        self.pending.fail_all();
    }
}
