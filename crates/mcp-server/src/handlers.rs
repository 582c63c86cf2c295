//! Handler traits the server role invokes for registered entities
//! (spec.md §4.6, C6), modeled on
//! `turbomcp-server/src/handlers/traits/{tool,resource,prompt,completion}.rs`
//! but simplified to this workspace's opaque-JSON entity contract
//! (spec.md §1: tool/resource/prompt payload semantics are out of scope).

use async_trait::async_trait;
use mcp_core::McpResult;
use mcp_protocol::{CompletionResult, PromptResult, ResourceContents, ToolResult};
use mcp_session::HandlerContext;
use serde_json::Value;

/// Executes a registered tool (spec.md §4.6: "passes the arguments JSON
/// object untouched to the registered tool handler").
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// `arguments` is the `tools/call` request's `arguments` object,
    /// untouched. Application-level failures belong in the returned
    /// `ToolResult` with `is_error: true`, not in the `Err` branch —
    /// `Err` here becomes a protocol-level JSON-RPC error instead
    /// (spec.md §4.6, §7).
    async fn call(&self, arguments: Option<Value>, ctx: HandlerContext) -> McpResult<ToolResult>;
}

/// Reads a registered resource or a resource matching a registered
/// template.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    async fn read(&self, uri: &str, ctx: HandlerContext) -> McpResult<Vec<ResourceContents>>;
}

/// Produces the message sequence for a registered prompt.
#[async_trait]
pub trait PromptHandler: Send + Sync {
    async fn get(&self, arguments: Option<Value>, ctx: HandlerContext) -> McpResult<PromptResult>;
}

/// Answers `completion/complete` requests (spec.md §6 method catalogue).
#[async_trait]
pub trait CompletionHandler: Send + Sync {
    async fn complete(&self, params: Value, ctx: HandlerContext) -> McpResult<CompletionResult>;
}
