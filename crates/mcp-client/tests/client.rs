//! End-to-end coverage of the client-role dispatcher (spec.md §8 scenarios
//! E1, E3, E6) driven over the in-memory transport pair, with a raw
//! `mcp_session::Session` standing in for the server role (the typed
//! server dispatcher lives in the separate `mcp-server` crate and is
//! exercised there; this crate only needs *a* correctly-behaving peer).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mcp_client::{Client, ClientBuilder, ElicitationHandler, RootsProvider, SamplingHandler};
use mcp_core::{methods, McpResult};
use mcp_protocol::{
    ClientCapabilities, ContentBlock, Implementation, InitializeParams, ModelPreferences, Role, Root,
    SamplingMessage, SamplingResult, ServerCapabilities, TextContent,
};
use mcp_session::{request_handler, Session};
use mcp_transport::duplex_pair;
use serde_json::{json, Value};

async fn running_peer_server(caps: ServerCapabilities) -> (Session, mcp_transport::InMemoryTransport) {
    let server = Session::new();
    server.register_request_handler(
        methods::INITIALIZE,
        request_handler(move |params, _ctx| {
            let caps = caps.clone();
            async move {
                let params: InitializeParams = serde_json::from_value(params.unwrap_or(Value::Null))?;
                assert_eq!(params.client_info.name, "test-client");
                Ok(json!({
                    "protocolVersion": mcp_core::PROTOCOL_VERSION,
                    "serverInfo": {"name": "test-server", "version": "0.1.0"},
                    "capabilities": caps,
                }))
            }
        }),
    );
    server.register_request_handler(
        methods::LIST_TOOLS,
        request_handler(|_params, _ctx| async {
            Ok(json!({ "tools": [{"name": "add", "inputSchema": {"type": "object"}}] }))
        }),
    );
    server.register_request_handler(
        methods::CALL_TOOL,
        request_handler(|_params, _ctx| async {
            Ok(json!({"content": [{"type": "text", "text": "8"}], "isError": false}))
        }),
    );

    let (client_transport, server_transport) = duplex_pair();
    server.start(server_transport).await.unwrap();
    (server, client_transport)
}

struct EchoSampling;

#[async_trait]
impl SamplingHandler for EchoSampling {
    async fn create_message(
        &self,
        messages: Vec<SamplingMessage>,
        _model_preferences: Option<ModelPreferences>,
        _max_tokens: u32,
    ) -> McpResult<SamplingResult> {
        let text = match &messages[0].content {
            ContentBlock::Text(TextContent { text, .. }) => text.clone(),
            _ => String::new(),
        };
        Ok(SamplingResult {
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

struct FixedRoots;

#[async_trait]
impl RootsProvider for FixedRoots {
    async fn list_roots(&self) -> McpResult<Vec<Root>> {
        Ok(vec![Root {
            uri: "file:///tmp".to_string(),
            name: Some("tmp".to_string()),
        }])
    }
}

struct AlwaysConfirm;

#[async_trait]
impl ElicitationHandler for AlwaysConfirm {
    async fn elicit(&self, _message: String, _requested_schema: Value) -> McpResult<Value> {
        Ok(json!({ "confirmed": true }))
    }
}

#[tokio::test]
async fn e1_connect_performs_the_handshake_and_learns_server_capabilities() {
    let (server, client_transport) = running_peer_server(ServerCapabilities::default().with_tools(true)).await;
    let client = Client::new(Implementation::new("test-client", "0.1.0"));

    let result = client.connect(client_transport).await.unwrap();
    assert_eq!(result.server_info.name, "test-server");
    assert!(client.remote_capabilities().supports_tools());
    server.stop().await.unwrap();
}

#[tokio::test]
async fn e3_list_tools_and_call_tool_round_trip() {
    let (_server, client_transport) = running_peer_server(ServerCapabilities::default().with_tools(true)).await;
    let client = Client::new(Implementation::new("test-client", "0.1.0"));
    client.connect(client_transport).await.unwrap();

    let tools = client.list_tools().await.unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "add");

    let result = client.call_tool("add", Some(json!({"a": 5, "b": 3}))).await.unwrap();
    assert!(!result.is_error);
}

#[tokio::test]
async fn calling_a_tool_without_the_servers_tools_capability_fails_locally() {
    let (_server, client_transport) = running_peer_server(ServerCapabilities::default()).await;
    let client = Client::new(Implementation::new("test-client", "0.1.0"));
    client.connect(client_transport).await.unwrap();

    let err = client.list_tools().await.unwrap_err();
    assert_eq!(err.kind, mcp_core::ErrorKind::CapabilityNotSupported);
}

#[tokio::test]
async fn e6_server_issued_sampling_request_reaches_the_registered_handler() {
    let (server, client_transport) = running_peer_server(ServerCapabilities::default()).await;
    let client = ClientBuilder::new(Implementation::new("test-client", "0.1.0"))
        .with_sampling_handler(Arc::new(EchoSampling))
        .build();
    client.connect(client_transport).await.unwrap();

    let result = server
        .send_request(
            methods::CREATE_MESSAGE,
            Some(json!({
                "messages": [{"role": "user", "content": {"type": "text", "text": "hi"}}],
                "maxTokens": 50,
            })),
        )
        .await
        .unwrap();
    assert_eq!(result["content"]["text"], "echo: hi");
    assert_eq!(result["model"], "test-model");
}

#[tokio::test]
async fn server_issued_roots_list_reaches_the_registered_provider() {
    let (server, client_transport) = running_peer_server(ServerCapabilities::default()).await;
    let client = ClientBuilder::new(Implementation::new("test-client", "0.1.0"))
        .with_roots_provider(Arc::new(FixedRoots))
        .build();
    client.connect(client_transport).await.unwrap();

    let result = server.send_request(methods::LIST_ROOTS, None).await.unwrap();
    let roots = result["roots"].as_array().unwrap();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0]["uri"], "file:///tmp");
}

#[tokio::test]
async fn server_issued_elicitation_reaches_the_registered_handler() {
    let (server, client_transport) = running_peer_server(ServerCapabilities::default()).await;
    let client = ClientBuilder::new(Implementation::new("test-client", "0.1.0"))
        .with_elicitation_handler(Arc::new(AlwaysConfirm))
        .build();
    client.connect(client_transport).await.unwrap();

    let result = server
        .send_request(
            methods::ELICIT,
            Some(json!({"message": "confirm?", "requestedSchema": {"type": "object"}})),
        )
        .await
        .unwrap();
    assert_eq!(result["confirmed"], true);
}

#[tokio::test]
async fn advertised_client_capabilities_reflect_registered_handlers() {
    let client = ClientBuilder::new(Implementation::new("test-client", "0.1.0"))
        .with_sampling_handler(Arc::new(EchoSampling))
        .with_roots_provider(Arc::new(FixedRoots))
        .build();
    let caps: ClientCapabilities = client.advertised_capabilities();
    assert!(caps.supports_sampling());
    assert!(caps.supports_roots());
    assert!(!caps.supports_elicitation());
}

#[tokio::test]
async fn connecting_twice_fails_with_already_initialized() {
    let (_server, client_transport) = running_peer_server(ServerCapabilities::default()).await;
    let client = Client::new(Implementation::new("test-client", "0.1.0"));
    client.connect(client_transport).await.unwrap();

    tokio::time::sleep(Duration::from_millis(5)).await;
    let (_a, b) = duplex_pair();
    let err = client.connect(b).await.unwrap_err();
    assert_eq!(err.kind, mcp_core::ErrorKind::AlreadyInitialized);
}
