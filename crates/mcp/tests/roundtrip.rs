//! Cross-role coverage with both sides typed: a real [`mcp::Server`] talking
//! to a real [`mcp::Client`] (spec.md §8, scenarios E1-E6). `mcp-server`'s
//! own tests stub the client side with a raw `Session`, and `mcp-client`'s
//! stub the server side the same way; this crate is the one place both
//! real dispatchers run against each other.

use std::sync::Arc;
use std::time::Duration;

use mcp::prelude::*;
use serde_json::json;

struct AddTool;

#[async_trait]
impl ToolHandler for AddTool {
    async fn call(&self, arguments: Option<serde_json::Value>, _ctx: HandlerContext) -> McpResult<ToolResult> {
        let args = arguments.unwrap_or(serde_json::Value::Null);
        let a = args.get("a").and_then(serde_json::Value::as_i64).unwrap_or(0);
        let b = args.get("b").and_then(serde_json::Value::as_i64).unwrap_or(0);
        Ok(ToolResult::text((a + b).to_string()))
    }
}

struct HelloResource;

#[async_trait]
impl ResourceHandler for HelloResource {
    async fn read(&self, uri: &str, _ctx: HandlerContext) -> McpResult<Vec<ResourceContents>> {
        Ok(vec![ResourceContents::text(uri, "text/plain", "hello")])
    }
}

struct EchoSampling;

#[async_trait]
impl SamplingHandler for EchoSampling {
    async fn create_message(
        &self,
        messages: Vec<mcp::protocol::SamplingMessage>,
        _model_preferences: Option<mcp::protocol::ModelPreferences>,
        _max_tokens: u32,
    ) -> McpResult<mcp::protocol::SamplingResult> {
        let text = match &messages[0].content {
            ContentBlock::Text(TextContent { text, .. }) => text.clone(),
            _ => String::new(),
        };
        Ok(mcp::protocol::SamplingResult {
            role: Role::Assistant,
            content: ContentBlock::Text(TextContent {
                text: format!("echo: {text}"),
                _meta: None,
            }),
            model: "test-model".to_string(),
            stop_reason: Some("endTurn".to_string()),
        })
    }
}

fn build_server() -> Server {
    let server = Server::new(Implementation::new("roundtrip-server", "0.1.0")).with_instructions("be nice");
    server.add_tool(Tool::new("add", json!({"type": "object"})), Arc::new(AddTool));
    server.add_resource(Resource::new("test://hello", "hello"), Arc::new(HelloResource));
    server
}

async fn connected_pair() -> (Server, Client) {
    let server = build_server();
    let client = ClientBuilder::new(Implementation::new("roundtrip-client", "0.1.0"))
        .with_sampling_handler(Arc::new(EchoSampling))
        .build();

    let (client_transport, server_transport) = duplex_pair();
    server.start(server_transport).await.unwrap();
    let result = client.connect(client_transport).await.unwrap();
    assert_eq!(result.server_info.name, "roundtrip-server");
    assert_eq!(result.instructions.as_deref(), Some("be nice"));

    (server, client)
}

#[tokio::test]
async fn full_handshake_tool_call_and_resource_read_round_trip() {
    let (_server, client) = connected_pair().await;

    assert!(client.remote_capabilities().supports_tools());
    let tools = client.list_tools().await.unwrap();
    assert_eq!(tools[0].name, "add");

    let sum = client.call_tool("add", Some(json!({"a": 4, "b": 9}))).await.unwrap();
    assert!(!sum.is_error);
    match &sum.content[0] {
        ContentBlock::Text(text) => assert_eq!(text.text, "13"),
        other => panic!("expected text content, got {other:?}"),
    }

    let contents = client.read_resource("test://hello").await.unwrap();
    assert_eq!(contents.len(), 1);
}

#[tokio::test]
async fn resource_subscription_notifies_the_connected_client() {
    use std::sync::atomic::{AtomicBool, Ordering};

    let (server, client) = connected_pair().await;
    client.subscribe_resource("test://hello").await.unwrap();

    let seen = Arc::new(AtomicBool::new(false));
    {
        let seen = seen.clone();
        client.session().register_notification_handler(
            methods::RESOURCES_UPDATED,
            notification_handler(move |_params, _ctx| {
                let seen = seen.clone();
                async move {
                    seen.store(true, Ordering::SeqCst);
                }
            }),
        );
    }

    server.notify_resource_updated("test://hello");
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(seen.load(Ordering::SeqCst));
}

#[tokio::test]
async fn server_issued_sampling_reaches_the_clients_registered_handler() {
    let (server, _client) = connected_pair().await;

    let result = create_message(
        server.session(),
        &ClientCapabilities::default().with_sampling(),
        vec![user_message("hi")],
        None,
        50,
    )
    .await
    .unwrap();
    match result.content {
        ContentBlock::Text(text) => assert_eq!(text.text, "echo: hi"),
        other => panic!("expected text content, got {other:?}"),
    }
}

#[tokio::test]
async fn calling_a_tool_the_server_never_registered_is_tool_not_found() {
    let (_server, client) = connected_pair().await;
    let err = client.call_tool("missing", Some(json!({}))).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::MethodNotFound);
}
