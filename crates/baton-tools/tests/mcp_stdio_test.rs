//! MCP client against real child processes

#![cfg(unix)]

use baton_tools::mcp::{InitOptions, McpClient, McpServerConfig, McpTransport};
use std::collections::BTreeMap;
use std::time::Duration;

/// Minimal line-oriented MCP server: answers initialize, tools/list and
/// tools/call, ignores notifications.
const FIXTURE_SERVER: &str = r#"
while IFS= read -r line; do
  id=$(printf '%s' "$line" | sed -n 's/.*"id":\([0-9][0-9]*\).*/\1/p')
  [ -z "$id" ] && continue
  case "$line" in
    *'"initialize"'*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"protocolVersion":"2024-11-05","capabilities":{"tools":{}},"serverInfo":{"name":"fixture"}}}\n' "$id" ;;
    *'"tools/list"'*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"tools":[{"name":"%s","description":"Fixture tool","inputSchema":{"type":"object"}}]}}\n' "$id" "$TOOL_NAME" ;;
    *'"tools/call"'*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"content":[{"type":"text","text":"pong from %s"}]}}\n' "$id" "$TOOL_NAME" ;;
    *)
      printf '{"jsonrpc":"2.0","id":%s,"error":{"code":-32601,"message":"method not found"}}\n' "$id" ;;
  esac
done
"#;

fn fixture(name: &str, tool: &str) -> McpServerConfig {
    let mut env = BTreeMap::new();
    env.insert("TOOL_NAME".to_string(), tool.to_string());
    McpServerConfig::new(
        name,
        McpTransport::Stdio {
            command: "sh".to_string(),
            args: vec!["-c".to_string(), FIXTURE_SERVER.to_string()],
            env,
        },
    )
}

fn unreachable(name: &str) -> McpServerConfig {
    McpServerConfig::new(
        name,
        McpTransport::Stdio {
            command: "/nonexistent/baton-fixture-server".to_string(),
            args: vec![],
            env: BTreeMap::new(),
        },
    )
}

#[tokio::test]
async fn test_one_unreachable_server_of_three() {
    let client = McpClient::new(vec![
        fixture("notes", "take_note"),
        unreachable("broken"),
        fixture("weather", "forecast"),
    ])
    .with_timeout(Duration::from_secs(10));

    client.init(InitOptions::default()).await.unwrap();

    let servers = client.get_all_servers().await;
    let reachable: Vec<&str> = servers
        .iter()
        .filter(|s| s.reachable)
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(reachable, vec!["notes", "weather"]);

    let broken = servers.iter().find(|s| s.name == "broken").unwrap();
    assert!(broken.error.is_some());

    let notes = servers.iter().find(|s| s.name == "notes").unwrap();
    assert_eq!(notes.tools[0].name, "take_note");

    let result = client
        .call_tool_by_name("forecast", serde_json::json!({"city": "Oslo"}))
        .await
        .unwrap();
    assert_eq!(result.text(), "pong from forecast");

    client.close().await;
    client.close().await;
    assert!(client.reachable_servers().await.is_empty());
}

#[tokio::test]
async fn test_server_that_never_answers_times_out() {
    let silent = McpServerConfig::new(
        "silent",
        McpTransport::Stdio {
            command: "sh".to_string(),
            args: vec!["-c".to_string(), "sleep 30".to_string()],
            env: BTreeMap::new(),
        },
    );
    let client =
        McpClient::new(vec![silent, fixture("notes", "take_note")]).with_timeout(Duration::from_millis(500));

    let started = std::time::Instant::now();
    client.init(InitOptions::default()).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(10));

    assert_eq!(client.reachable_servers().await, vec!["notes".to_string()]);
    client.close().await;
}
