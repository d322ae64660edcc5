//! Drives the protocol backend against a tiny stdio server written in `sh`.

use mcphost_core::{
    BackendMode, ClientMode, InteractionLogger, ManagerOptions, ServerConfig, ToolClientManager,
    ToolError,
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const ECHO_SERVER: &str = r#"#!/bin/sh
while IFS= read -r line; do
  id=$(printf '%s' "$line" | sed -n 's/^{"jsonrpc":"2.0","id":\([0-9][0-9]*\),.*/\1/p')
  case "$line" in
    *'"method":"initialize"'*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"protocolVersion":"2024-11-05","capabilities":{"tools":{}},"serverInfo":{"name":"echo","version":"0.1.0"}}}\n' "$id"
      ;;
    *'"method":"tools/list"'*)
      printf '{"jsonrpc":"2.0","method":"notifications/message","params":{"level":"info"}}\n'
      printf '{"jsonrpc":"2.0","id":"stray","error":{"code":-32000,"message":"late reply"}}\n'
      printf '{"jsonrpc":"2.0","id":%s,"result":{"tools":[{"name":"echo","description":"Echo the text back","inputSchema":{"type":"object","properties":{"text":{"type":"string"}},"required":["text"]}}]}}\n' "$id"
      ;;
    *'"method":"tools/call"'*'boom'*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"content":[{"type":"text","text":"exploded"}],"isError":true}}\n' "$id"
      ;;
    *'"method":"tools/call"'*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"content":[{"type":"text","text":"pong"}]}}\n' "$id"
      ;;
  esac
done
"#;

fn sh_available() -> bool {
    which::which("sh").is_ok()
}

fn write_server(dir: &Path) -> PathBuf {
    let path = dir.join("echo_server.sh");
    std::fs::write(&path, ECHO_SERVER).unwrap();
    path
}

fn server(id: &str, command: &str, args: Vec<String>) -> ServerConfig {
    ServerConfig {
        id: id.to_string(),
        command: command.to_string(),
        args,
        env: HashMap::new(),
    }
}

async fn start(tmp: &TempDir, servers: Vec<ServerConfig>) -> ToolClientManager {
    let logger = Arc::new(InteractionLogger::open(tmp.path().join("log.jsonl")).unwrap());
    let options = ManagerOptions {
        mode: ClientMode::Auto,
        servers,
        workspace_dir: tmp.path().join("workspace"),
        request_timeout: Duration::from_secs(10),
    };
    ToolClientManager::start(options, logger).await
}

fn read_log(path: &Path) -> Vec<Value> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test]
async fn partial_startup_keeps_healthy_servers() {
    if !sh_available() {
        eprintln!("sh not on PATH, skipping");
        return;
    }

    let tmp = TempDir::new().unwrap();
    let script = write_server(tmp.path());
    let manager = start(
        &tmp,
        vec![
            server("echo", "sh", vec![script.to_string_lossy().to_string()]),
            server("ghost", "/nonexistent/mcp-server-binary", vec![]),
        ],
    )
    .await;

    assert_eq!(manager.mode(), BackendMode::Protocol);
    assert_eq!(manager.server_ids().await, vec!["echo".to_string()]);
    assert!(manager.is_connected("echo").await);
    assert!(!manager.is_connected("ghost").await);

    let records = read_log(manager.log_path());
    let init = records
        .iter()
        .find(|r| r["event"] == "initialize")
        .unwrap();
    assert_eq!(init["server"], "echo");
    assert_eq!(init["server_info"]["name"], "echo");
    let init_err = records
        .iter()
        .find(|r| r["event"] == "initialize_error")
        .unwrap();
    assert_eq!(init_err["server"], "ghost");

    manager.close().await;
}

#[tokio::test]
async fn list_and_call_over_stdio() {
    if !sh_available() {
        eprintln!("sh not on PATH, skipping");
        return;
    }

    let tmp = TempDir::new().unwrap();
    let script = write_server(tmp.path());
    let manager = start(
        &tmp,
        vec![server("echo", "sh", vec![script.to_string_lossy().to_string()])],
    )
    .await;

    let tools = manager.list_tools(None).await;
    assert_eq!(tools["echo"].len(), 1);
    assert_eq!(tools["echo"][0].name, "echo");
    assert_eq!(tools["echo"][0].input_schema["required"][0], "text");

    assert!(manager.list_tools(Some("missing")).await.is_empty());

    let schema = manager.get_schema("echo", "echo").await.unwrap();
    assert_eq!(schema.description, "Echo the text back");
    assert!(matches!(
        manager.get_schema("echo", "nope").await,
        Err(ToolError::NotFound { .. })
    ));

    let result = manager
        .call_tool("echo", "echo", json!({"text": "ping"}))
        .await
        .unwrap();
    assert_eq!(result["content"][0]["text"], "pong");

    let err = manager
        .call_tool("echo", "echo", json!({"text": "boom"}))
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::Execution(ref m) if m == "exploded"));

    let err = manager
        .call_tool("ghost", "echo", json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::NotConnected(_)));

    manager.close().await;
    manager.close().await;

    assert!(manager.server_ids().await.is_empty());
    assert!(matches!(
        manager.call_tool("echo", "echo", json!({"text": "late"})).await,
        Err(ToolError::NotConnected(_))
    ));

    let records = read_log(manager.log_path());
    let calls = records.iter().filter(|r| r["event"] == "tools/call").count();
    let terminals = records
        .iter()
        .filter(|r| r["event"] == "tools/response" || r["event"] == "tools/error")
        .count();
    assert_eq!(calls, 4);
    assert_eq!(calls, terminals);
}

#[tokio::test]
async fn builtin_mode_ignores_configured_servers() {
    let tmp = TempDir::new().unwrap();
    let logger = Arc::new(InteractionLogger::open(tmp.path().join("log.jsonl")).unwrap());
    let manager = ToolClientManager::start(
        ManagerOptions {
            mode: ClientMode::Builtin,
            servers: vec![server("echo", "sh", vec![])],
            workspace_dir: tmp.path().join("workspace"),
            request_timeout: Duration::from_secs(5),
        },
        logger,
    )
    .await;

    assert_eq!(manager.mode(), BackendMode::Builtin);
    let tools = manager.list_tools(None).await;
    assert_eq!(tools.keys().collect::<Vec<_>>(), vec!["fs", "git"]);

    let records = read_log(manager.log_path());
    assert_eq!(records[0]["event"], "sdk_unavailable");
    assert!(records[0]["reason"].is_string());
}
