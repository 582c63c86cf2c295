//! Handler traits for the client's own server-to-client surface (spec.md
//! §1: "itself exposing *sampling*, *roots*, *elicitation*"; §4.6:
//! "Client role ... registers handlers for the server-to-client
//! requests"), modeled on `turbomcp-client/src/handlers.rs` and
//! `turbomcp-client/src/sampling.rs` but narrowed to this workspace's
//! opaque-payload entity types.

use async_trait::async_trait;
use mcp_core::McpResult;
use mcp_protocol::{ModelPreferences, Root, SamplingMessage, SamplingResult};
use serde_json::Value;

/// Answers `sampling/createMessage` requests issued by the connected
/// server (role reversal, spec.md §4.6).
#[async_trait]
pub trait SamplingHandler: Send + Sync {
    async fn create_message(
        &self,
        messages: Vec<SamplingMessage>,
        model_preferences: Option<ModelPreferences>,
        max_tokens: u32,
    ) -> McpResult<SamplingResult>;
}

/// Supplies the client's `file://` root boundaries on `roots/list`
/// (spec.md §3, GLOSSARY: "Root: owned and listed by the client").
#[async_trait]
pub trait RootsProvider: Send + Sync {
    async fn list_roots(&self) -> McpResult<Vec<Root>>;
}

/// Answers `elicitation/create` requests: the server asks the user (via
/// the client) for structured input matching a JSON schema.
#[async_trait]
pub trait ElicitationHandler: Send + Sync {
    async fn elicit(&self, message: String, requested_schema: Value) -> McpResult<Value>;
}
