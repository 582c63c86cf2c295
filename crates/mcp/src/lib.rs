//! A transport-agnostic Model Context Protocol session engine (spec.md §1).
//!
//! This crate is a thin facade over the workspace's seven library crates —
//! it adds no behavior of its own, only re-exports, so a consumer can
//! depend on `mcp` alone instead of naming each crate individually:
//!
//! - [`mcp_core`] — error taxonomy, request ids, protocol constants
//! - [`mcp_protocol`] — JSON-RPC codec, MCP entity model, capabilities
//! - [`mcp_transport`] — the [`Transport`] trait and an in-memory pair for tests
//! - [`mcp_session`] — the session engine: dispatch, correlation, state
//! - [`mcp_server`] — the server-role dispatcher
//! - [`mcp_client`] — the client-role dispatcher
//! - [`mcp_unix`] — a Unix domain socket transport and listener
//!
//! ```no_run
//! use mcp::prelude::*;
//! use std::sync::Arc;
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl ToolHandler for Echo {
//!     async fn call(&self, arguments: Option<serde_json::Value>, _ctx: HandlerContext) -> McpResult<ToolResult> {
//!         Ok(ToolResult::text(arguments.unwrap_or_default().to_string()))
//!     }
//! }
//!
//! # async fn run() -> McpResult<()> {
//! let server = Server::new(Implementation::new("echo-server", "0.1.0"));
//! server.add_tool(Tool::new("echo", serde_json::json!({"type": "object"})), Arc::new(Echo));
//! mcp_unix::run(move || {
//!     let server = Server::new(Implementation::new("echo-server", "0.1.0"));
//!     server.add_tool(Tool::new("echo", serde_json::json!({"type": "object"})), Arc::new(Echo));
//!     server
//! }, "/tmp/echo.sock").await?;
//! # Ok(())
//! # }
//! ```

pub use mcp_core as core;
pub use mcp_protocol as protocol;
pub use mcp_transport as transport;

pub use mcp_client::{Client, ClientBuilder, ElicitationHandler, RootsProvider, SamplingHandler};
pub use mcp_core::{methods, ErrorKind, McpError, McpResult, RequestId};
pub use mcp_protocol::{
    ClientCapabilities, ContentBlock, Implementation, InitializeParams, InitializeResult, Message,
    Prompt, PromptArgument, PromptMessage, PromptResult, Resource, ResourceContents,
    ResourceTemplate, Role, ServerCapabilities, TextContent, Tool, ToolResult,
};
pub use mcp_server::{
    completion_values, create_message, elicit, list_roots, user_message, CompletionHandler,
    PromptHandler, ResourceHandler, Server, TaskStore, ToolHandler,
};
pub use mcp_session::{request_handler, notification_handler, HandlerContext, Session, SessionState};
pub use mcp_transport::{duplex_pair, InMemoryTransport, Transport, TransportEvent, TransportState};
pub use mcp_unix::{run as run_unix, run_with_config as run_unix_with_config, UnixListenerConfig, UnixSocketTransport};

/// Everything most integrations need in one `use` (spec.md §1, ergonomic
/// surface over the seven crates above).
pub mod prelude {
    pub use crate::{
        duplex_pair, methods, notification_handler, request_handler, Client, ClientBuilder,
        ClientCapabilities, CompletionHandler, ContentBlock, ElicitationHandler, ErrorKind,
        HandlerContext, Implementation, InMemoryTransport, McpError, McpResult, Message,
        Prompt, PromptArgument, PromptHandler, PromptMessage, PromptResult, RequestId, Resource,
        ResourceContents, ResourceHandler, ResourceTemplate, Role, RootsProvider, SamplingHandler,
        Server, ServerCapabilities, Session, SessionState, TaskStore, TextContent, Tool,
        ToolHandler, ToolResult, Transport, TransportEvent, TransportState,
    };
    pub use async_trait::async_trait;
}
