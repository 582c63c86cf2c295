//! End-to-end coverage of the Unix socket listener against a real socket
//! file (spec.md C7 supplement) — `tempfile::tempdir()` gives each test its
//! own throwaway directory for the socket path, since `InMemoryTransport`
//! can't exercise this transport.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mcp_core::methods;
use mcp_protocol::{Implementation, Tool, ToolResult};
use mcp_server::{Server, ToolHandler};
use mcp_session::{HandlerContext, Session};
use mcp_unix::{UnixListenerConfig, UnixSocketTransport};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::sync::watch;

struct AddTool;

#[async_trait]
impl ToolHandler for AddTool {
    async fn call(&self, arguments: Option<Value>, _ctx: HandlerContext) -> mcp_core::McpResult<ToolResult> {
        let args = arguments.unwrap_or(Value::Null);
        let a = args.get("a").and_then(Value::as_i64).unwrap_or(0);
        let b = args.get("b").and_then(Value::as_i64).unwrap_or(0);
        Ok(ToolResult::text((a + b).to_string()))
    }
}

fn make_server() -> Server {
    let server = Server::new(Implementation::new("unix-test-server", "0.1.0"));
    server.add_tool(Tool::new("add", json!({"type": "object"})), Arc::new(AddTool));
    server
}

async fn handshake(client: &Session) {
    let init = client
        .send_request(
            methods::INITIALIZE,
            Some(json!({
                "protocolVersion": "2025-06-18",
                "clientInfo": {"name": "unix-test-client", "version": "0.1.0"},
                "capabilities": {},
            })),
        )
        .await
        .unwrap();
    assert_eq!(init["serverInfo"]["name"], "unix-test-server");
    client.complete_initialization().unwrap();
}

#[tokio::test]
async fn client_connects_over_a_real_socket_and_calls_a_tool() {
    let dir = tempfile::tempdir().unwrap();
    let socket_path = dir.path().join("mcp.sock");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let listener_path = socket_path.clone();
    let listener_task = tokio::spawn(async move {
        mcp_unix::run_with_shutdown(make_server, listener_path, UnixListenerConfig::default(), shutdown_rx)
            .await
            .unwrap();
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let client = Session::new();
    let transport = UnixSocketTransport::connect_to(socket_path.clone());
    client.start(transport).await.unwrap();
    handshake(&client).await;

    let result = client
        .send_request(methods::CALL_TOOL, Some(json!({"name": "add", "arguments": {"a": 2, "b": 4}})))
        .await
        .unwrap();
    assert_eq!(result["content"][0]["text"], "6");

    shutdown_tx.send(true).unwrap();
    listener_task.await.unwrap();
    assert!(!socket_path.exists());
}

#[tokio::test]
async fn connections_past_the_limit_are_rejected_without_consuming_a_slot() {
    let dir = tempfile::tempdir().unwrap();
    let socket_path = dir.path().join("mcp.sock");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let listener_path = socket_path.clone();
    let config = UnixListenerConfig { max_connections: 1 };
    let listener_task = tokio::spawn(async move {
        mcp_unix::run_with_shutdown(make_server, listener_path, config, shutdown_rx)
            .await
            .unwrap();
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let client = Session::new();
    let transport = UnixSocketTransport::connect_to(socket_path.clone());
    client.start(transport).await.unwrap();
    handshake(&client).await;

    let mut rejected = UnixStream::connect(&socket_path).await.unwrap();
    let mut buf = [0u8; 4096];
    let n = tokio::time::timeout(Duration::from_secs(2), rejected.read(&mut buf))
        .await
        .unwrap()
        .unwrap();
    let line = String::from_utf8_lossy(&buf[..n]);
    let value: Value = serde_json::from_str(line.trim()).unwrap();
    assert_eq!(value["error"]["code"], mcp_core::ErrorKind::InternalError.to_json_rpc_code());
    assert!(value.get("id").is_none());

    let result = client
        .send_request(methods::CALL_TOOL, Some(json!({"name": "add", "arguments": {"a": 1, "b": 1}})))
        .await
        .unwrap();
    assert_eq!(result["content"][0]["text"], "2");

    shutdown_tx.send(true).unwrap();
    listener_task.await.unwrap();
}

#[tokio::test]
async fn stale_socket_file_is_removed_before_bind() {
    let dir = tempfile::tempdir().unwrap();
    let socket_path = dir.path().join("mcp.sock");
    std::fs::write(&socket_path, b"stale").unwrap();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let listener_path = socket_path.clone();
    let listener_task = tokio::spawn(async move {
        mcp_unix::run_with_shutdown(make_server, listener_path, UnixListenerConfig::default(), shutdown_rx)
            .await
            .unwrap();
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let client = Session::new();
    let transport = UnixSocketTransport::connect_to(socket_path.clone());
    client.start(transport).await.unwrap();
    handshake(&client).await;

    shutdown_tx.send(true).unwrap();
    listener_task.await.unwrap();
    assert!(!socket_path.exists());
}
