//! JSON-RPC 2.0 message codec, MCP entity model and capability types.
//!
//! This crate has no I/O and no concurrency — it is pure value types and
//! pure functions over them. `mcp-session` owns the event loop; this crate
//! only tells it how to read and write bytes.

pub mod capabilities;
pub mod content;
pub mod entities;
pub mod jsonrpc;

pub use capabilities::{
    ClientCapabilities, Implementation, InitializeParams, InitializeResult, ListChangedCapability,
    ResourcesCapability, ServerCapabilities,
};
pub use content::{
    AudioContent, ContentBlock, EmbeddedResourceContent, ImageContent, ResourceContents, ResourceLink,
    TextContent,
};
pub use entities::{
    CompletionResult, CompletionValues, ModelHint, ModelPreferences, Prompt, PromptArgument, PromptMessage,
    PromptResult, Resource, ResourceTemplate, Role, Root, SamplingMessage, SamplingResult, Task, TaskStatus,
    Tool, ToolResult,
};
pub use jsonrpc::{ErrorObject, ErrorResponse, Message, Notification, Request, Response, JSONRPC_VERSION};
