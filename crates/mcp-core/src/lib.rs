//! Error taxonomy, request identifiers and protocol constants shared by
//! every crate in the session engine workspace.
//!
//! This crate has no knowledge of JSON-RPC framing or MCP entities — those
//! live in `mcp-protocol`. It only carries the vocabulary other crates build
//! on: [`error::McpError`]/[`error::ErrorKind`], [`ids::RequestId`], and the
//! numeric/string constants below.

pub mod error;
pub mod ids;

pub use error::{ErrorKind, McpError, McpResult};
pub use ids::RequestId;

/// The MCP protocol version this workspace implements and offers during
/// `initialize` negotiation (spec.md §4.4).
pub const PROTOCOL_VERSION: &str = "2025-06-18";

/// Protocol versions this workspace can still negotiate down to when a peer
/// offers an older one it recognizes (spec.md §4.4, "negotiation").
pub const SUPPORTED_VERSIONS: &[&str] = &["2025-06-18", "2025-03-26"];

/// Default maximum size, in bytes, of a single encoded JSON-RPC message
/// (spec.md §4.1 edge case: oversized messages are rejected, not split).
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Well-known MCP method name strings, centralized so the codec, the
/// session engine and both dispatcher crates agree on spelling.
pub mod methods {
    pub const INITIALIZE: &str = "initialize";
    pub const INITIALIZED: &str = "notifications/initialized";
    pub const PING: &str = "ping";
    pub const CANCELLED: &str = "notifications/cancelled";
    pub const PROGRESS: &str = "notifications/progress";

    pub const LIST_TOOLS: &str = "tools/list";
    pub const CALL_TOOL: &str = "tools/call";
    pub const TOOLS_LIST_CHANGED: &str = "notifications/tools/list_changed";

    pub const LIST_RESOURCES: &str = "resources/list";
    pub const LIST_RESOURCE_TEMPLATES: &str = "resources/templates/list";
    pub const READ_RESOURCE: &str = "resources/read";
    pub const SUBSCRIBE_RESOURCE: &str = "resources/subscribe";
    pub const UNSUBSCRIBE_RESOURCE: &str = "resources/unsubscribe";
    pub const RESOURCES_LIST_CHANGED: &str = "notifications/resources/list_changed";
    pub const RESOURCES_UPDATED: &str = "notifications/resources/updated";

    pub const LIST_PROMPTS: &str = "prompts/list";
    pub const GET_PROMPT: &str = "prompts/get";
    pub const PROMPTS_LIST_CHANGED: &str = "notifications/prompts/list_changed";

    pub const COMPLETE: &str = "completion/complete";

    pub const SET_LOG_LEVEL: &str = "logging/setLevel";
    pub const LOG_MESSAGE: &str = "notifications/message";

    pub const CREATE_MESSAGE: &str = "sampling/createMessage";
    pub const LIST_ROOTS: &str = "roots/list";
    pub const ROOTS_LIST_CHANGED: &str = "notifications/roots/list_changed";
    pub const ELICIT: &str = "elicitation/create";

    pub const GET_TASK: &str = "tasks/get";
    pub const TASK_RESULT: &str = "tasks/result";
    pub const CANCEL_TASK: &str = "tasks/cancel";
    pub const LIST_TASKS: &str = "tasks/list";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_version_is_in_supported_list() {
        assert!(SUPPORTED_VERSIONS.contains(&PROTOCOL_VERSION));
    }
}
