//! HTTP transports: streamable HTTP and legacy SSE

use super::protocol::{McpError, McpRequest, McpResponse, McpResult};
use super::transport::{McpSession, PendingRequests};
use baton_llm::util::expand_env;
use futures::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const SESSION_HEADER: &str = "Mcp-Session-Id";

fn expand_headers(headers: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(k, v)| (k.clone(), expand_env(v)))
        .collect()
}

fn transport_err(server: &str, e: impl std::fmt::Display) -> McpError {
    McpError::Transport(format!("{server}: {e}"))
}

async fn check_status(server: &str, resp: reqwest::Response) -> McpResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(McpError::Transport(format!(
        "{server} returned HTTP {status}: {body}"
    )))
}

/// One server-sent event
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SseEvent {
    pub event: String,
    pub data: String,
}

/// Incremental `text/event-stream` decoder
#[derive(Debug, Default)]
pub(crate) struct SseParser {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseParser {
    /// Feed bytes, returning every event completed by them
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw)
                .trim_end_matches(['\n', '\r'])
                .to_string();

            if line.is_empty() {
                if self.data.is_empty() {
                    self.event = None;
                } else {
                    events.push(SseEvent {
                        event: self.event.take().unwrap_or_else(|| "message".to_string()),
                        data: self.data.join("\n"),
                    });
                    self.data.clear();
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
                None => (line.as_str(), ""),
            };
            match field {
                "event" => self.event = Some(value.to_string()),
                "data" => self.data.push(value.to_string()),
                _ => {}
            }
        }

        events
    }
}

// ============================================================================
// Streamable HTTP
// ============================================================================

/// Session over the streamable HTTP transport
pub struct HttpSession {
    name: String,
    client: reqwest::Client,
    url: String,
    headers: BTreeMap<String, String>,
    session_id: Mutex<Option<String>>,
    next_id: AtomicU64,
    closed: AtomicBool,
    request_timeout: Duration,
}

impl HttpSession {
    /// Create a session; nothing is sent until the first request
    #[must_use]
    pub fn new(
        name: &str,
        client: reqwest::Client,
        url: &str,
        headers: &BTreeMap<String, String>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            name: name.to_string(),
            client,
            url: url.to_string(),
            headers: expand_headers(headers),
            session_id: Mutex::new(None),
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
            request_timeout,
        }
    }

    fn session_id(&self) -> Option<String> {
        self.session_id
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    async fn post(&self, body: &McpRequest) -> McpResult<reqwest::Response> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(McpError::Closed(self.name.clone()));
        }

        let mut request = self
            .client
            .post(&self.url)
            .header(ACCEPT, "application/json, text/event-stream")
            .json(body);
        for (key, value) in &self.headers {
            request = request.header(key, value);
        }
        if let Some(id) = self.session_id() {
            request = request.header(SESSION_HEADER, id);
        }

        debug!(server = %self.name, method = %body.method, "POST to MCP server");
        let resp = request
            .send()
            .await
            .map_err(|e| transport_err(&self.name, e))?;

        if let Some(id) = resp
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            *self.session_id.lock().unwrap_or_else(|e| e.into_inner()) = Some(id.to_string());
        }

        check_status(&self.name, resp).await
    }

    async fn read_reply(&self, resp: reqwest::Response, id: u64) -> McpResult<McpResponse> {
        let is_stream = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("text/event-stream"));

        if is_stream {
            let mut stream = resp.bytes_stream();
            let mut parser = SseParser::default();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(|e| transport_err(&self.name, e))?;
                for event in parser.push(&chunk) {
                    match serde_json::from_str::<McpResponse>(&event.data) {
                        Ok(reply) if reply.is_reply() && reply.id == Some(id) => return Ok(reply),
                        Ok(_) => {}
                        Err(e) => debug!(server = %self.name, error = %e, "Skipping event"),
                    }
                }
            }
            return Err(McpError::Protocol(format!(
                "{}: stream ended before reply {id}",
                self.name
            )));
        }

        let value: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| McpError::Protocol(format!("{}: {e}", self.name)))?;
        let candidates = match value {
            serde_json::Value::Array(items) => items,
            other => vec![other],
        };
        candidates
            .into_iter()
            .filter_map(|v| serde_json::from_value::<McpResponse>(v).ok())
            .find(|r| r.is_reply() && r.id == Some(id))
            .ok_or_else(|| McpError::Protocol(format!("{}: no reply for request {id}", self.name)))
    }
}

#[async_trait::async_trait]
impl McpSession for HttpSession {
    async fn request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> McpResult<serde_json::Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = McpRequest::new(method, id).with_params(params);
        let exchange = async {
            let resp = self.post(&request).await?;
            self.read_reply(resp, id).await
        };
        tokio::time::timeout(self.request_timeout, exchange)
            .await
            .map_err(|_| McpError::Timeout(self.request_timeout))??
            .into_result()
    }

    async fn notify(&self, method: &str, params: Option<serde_json::Value>) -> McpResult<()> {
        let request = McpRequest::notification(method).with_params(params);
        tokio::time::timeout(self.request_timeout, self.post(&request))
            .await
            .map_err(|_| McpError::Timeout(self.request_timeout))??;
        Ok(())
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let Some(id) = self.session_id() else {
            return;
        };
        let mut request = self.client.delete(&self.url).header(SESSION_HEADER, id);
        for (key, value) in &self.headers {
            request = request.header(key, value);
        }
        if let Err(e) = request.send().await {
            debug!(server = %self.name, error = %e, "Session delete failed");
        }
        info!(server = %self.name, "MCP HTTP session closed");
    }
}

// ============================================================================
// Legacy SSE
// ============================================================================

/// Session over the legacy SSE transport
pub struct SseSession {
    name: String,
    client: reqwest::Client,
    endpoint: String,
    headers: BTreeMap<String, String>,
    pending: PendingRequests,
    reader: Mutex<Option<JoinHandle<()>>>,
    request_timeout: Duration,
}

impl SseSession {
    /// Open the event stream and wait for the `endpoint` event
    pub async fn connect(
        name: &str,
        client: reqwest::Client,
        url: &str,
        headers: &BTreeMap<String, String>,
        request_timeout: Duration,
    ) -> McpResult<Self> {
        let headers = expand_headers(headers);
        let base = reqwest::Url::parse(url).map_err(|e| transport_err(name, e))?;

        let mut request = client.get(url).header(ACCEPT, "text/event-stream");
        for (key, value) in &headers {
            request = request.header(key, value);
        }
        let resp = tokio::time::timeout(request_timeout, request.send())
            .await
            .map_err(|_| McpError::Timeout(request_timeout))?
            .map_err(|e| transport_err(name, e))?;
        let resp = check_status(name, resp).await?;

        let pending = PendingRequests::new();
        let (endpoint_tx, endpoint_rx) = oneshot::channel::<String>();

        let reader_pending = pending.clone();
        let server_name = name.to_string();
        let reader = tokio::spawn(async move {
            let mut endpoint_tx = Some(endpoint_tx);
            let mut stream = resp.bytes_stream();
            let mut parser = SseParser::default();
            while let Some(chunk) = stream.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        warn!(server = %server_name, error = %e, "SSE stream error");
                        break;
                    }
                };
                for event in parser.push(&chunk) {
                    match event.event.as_str() {
                        "endpoint" => {
                            if let Some(tx) = endpoint_tx.take() {
                                let _ = tx.send(event.data.trim().to_string());
                            }
                        }
                        "message" => match serde_json::from_str::<McpResponse>(&event.data) {
                            Ok(response) => reader_pending.resolve(response),
                            Err(e) => {
                                warn!(server = %server_name, error = %e, "Failed to parse message");
                            }
                        },
                        other => debug!(server = %server_name, event = %other, "Ignoring event"),
                    }
                }
            }
            reader_pending.fail_all();
            debug!(server = %server_name, "SSE reader exited");
        });

        let endpoint = match tokio::time::timeout(request_timeout, endpoint_rx).await {
            Ok(Ok(endpoint)) => endpoint,
            Ok(Err(_)) => {
                return Err(McpError::Transport(format!(
                    "{name}: stream closed before endpoint event"
                )))
            }
            Err(_) => {
                reader.abort();
                return Err(McpError::Timeout(request_timeout));
            }
        };
        let endpoint = base
            .join(&endpoint)
            .map_err(|e| transport_err(name, e))?
            .to_string();

        info!(server = %name, endpoint = %endpoint, "MCP SSE session established");

        Ok(Self {
            name: name.to_string(),
            client,
            endpoint,
            headers,
            pending,
            reader: Mutex::new(Some(reader)),
            request_timeout,
        })
    }

    async fn post(&self, body: &McpRequest) -> McpResult<()> {
        if self
            .reader
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_none()
        {
            return Err(McpError::Closed(self.name.clone()));
        }
        let mut request = self.client.post(&self.endpoint).json(body);
        for (key, value) in &self.headers {
            request = request.header(key, value);
        }
        let resp = request
            .send()
            .await
            .map_err(|e| transport_err(&self.name, e))?;
        check_status(&self.name, resp).await.map(|_| ())
    }
}

#[async_trait::async_trait]
impl McpSession for SseSession {
    async fn request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> McpResult<serde_json::Value> {
        let id = self.pending.next_id();
        let rx = self.pending.register(id);
        let request = McpRequest::new(method, id).with_params(params);
        if let Err(e) = self.post(&request).await {
            self.pending.forget(id);
            return Err(e);
        }
        self.pending
            .wait(&self.name, id, rx, self.request_timeout)
            .await
    }

    async fn notify(&self, method: &str, params: Option<serde_json::Value>) -> McpResult<()> {
        self.post(&McpRequest::notification(method).with_params(params))
            .await
    }

    async fn close(&self) {
        let reader = self
            .reader
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(reader) = reader {
            reader.abort();
            info!(server = %self.name, "MCP SSE session closed");
        }
        self.pending.fail_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sse_parser_split_chunks() {
        let mut parser = SseParser::default();
        assert!(parser.push(b"event: endpoint\nda").is_empty());
        let events = parser.push(b"ta: /messages?session=1\n\n");
        assert_eq!(
            events,
            vec![SseEvent {
                event: "endpoint".to_string(),
                data: "/messages?session=1".to_string(),
            }]
        );
    }

    #[test]
    fn test_sse_parser_defaults_and_multiline() {
        let mut parser = SseParser::default();
        let events = parser.push(b": keepalive\r\ndata: {\"a\":\r\ndata: 1}\r\n\r\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "message");
        assert_eq!(events[0].data, "{\"a\":\n1}");
    }

    #[test]
    fn test_expand_headers() {
        std::env::set_var("BATON_HTTP_TEST_TOKEN", "t0k");
        let mut headers = BTreeMap::new();
        headers.insert(
            "Authorization".to_string(),
            "Bearer ${BATON_HTTP_TEST_TOKEN}".to_string(),
        );
        assert_eq!(expand_headers(&headers)["Authorization"], "Bearer t0k");
    }

    #[tokio::test]
    async fn test_closed_http_session_rejects_requests() {
        let session = HttpSession::new(
            "remote",
            reqwest::Client::new(),
            "http://127.0.0.1:9/mcp",
            &BTreeMap::new(),
            Duration::from_secs(1),
        );
        session.close().await;
        session.close().await;
        assert!(matches!(
            session.request("tools/list", None).await,
            Err(McpError::Closed(_))
        ));
    }
}
