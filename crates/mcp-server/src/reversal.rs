//! Server-issued requests into the role-reversed surface (spec.md §4.6:
//! "it also *issues* requests `sampling/createMessage`, `roots/list`, and
//! `elicitation/create`"). Each call is gated by the remote (client-side)
//! capability before touching the wire (spec.md §4.4, property 7).

use mcp_core::{methods, McpError, McpResult};
use mcp_protocol::{ClientCapabilities, CompletionValues, ModelPreferences, Role, SamplingMessage, SamplingResult};
use mcp_session::Session;
use serde_json::{json, Value};

fn require_capability(caps: &ClientCapabilities, supported: bool, name: &str) -> McpResult<()> {
    if supported {
        Ok(())
    } else {
        Err(McpError::capability_not_supported(name))
    }
}

/// Issue `sampling/createMessage` to the connected client.
///
/// # Errors
/// `CapabilityNotSupported` if the client never advertised `sampling`;
/// otherwise whatever the client's response/error carries.
pub async fn create_message(
    session: &Session,
    caps: &ClientCapabilities,
    messages: Vec<SamplingMessage>,
    model_preferences: Option<ModelPreferences>,
    max_tokens: u32,
) -> McpResult<SamplingResult> {
    require_capability(caps, caps.supports_sampling(), "sampling")?;
    let params = json!({
        "messages": messages,
        "modelPreferences": model_preferences,
        "maxTokens": max_tokens,
    });
    let result = session.send_request(methods::CREATE_MESSAGE, Some(params)).await?;
    serde_json::from_value(result).map_err(McpError::from)
}

/// Issue `roots/list` to the connected client.
///
/// # Errors
/// `CapabilityNotSupported` if the client never advertised `roots`.
pub async fn list_roots(session: &Session, caps: &ClientCapabilities) -> McpResult<Vec<mcp_protocol::Root>> {
    require_capability(caps, caps.supports_roots(), "roots")?;
    let result = session.send_request(methods::LIST_ROOTS, None).await?;
    let roots = result
        .get("roots")
        .cloned()
        .ok_or_else(|| McpError::invalid_request("roots/list result missing \"roots\""))?;
    serde_json::from_value(roots).map_err(McpError::from)
}

/// Issue `elicitation/create` to the connected client, requesting
/// structured user input against `requested_schema`.
///
/// # Errors
/// `CapabilityNotSupported` if the client never advertised `elicitation`.
pub async fn elicit(
    session: &Session,
    caps: &ClientCapabilities,
    message: impl Into<String>,
    requested_schema: Value,
) -> McpResult<Value> {
    require_capability(caps, caps.supports_elicitation(), "elicitation")?;
    let params = json!({
        "message": message.into(),
        "requestedSchema": requested_schema,
    });
    session.send_request(methods::ELICIT, Some(params)).await
}

/// Helper for completion handlers building a plain-values `completion`
/// result; not itself a reversal call but lives here since it's the
/// shared tail end of every completion path this crate exposes.
#[must_use]
pub fn completion_values(values: Vec<String>, total: Option<u64>, has_more: Option<bool>) -> CompletionValues {
    CompletionValues {
        values,
        total,
        has_more,
    }
}

/// Convenience constructor for a single-turn sampling request.
#[must_use]
pub fn user_message(text: impl Into<String>) -> SamplingMessage {
    SamplingMessage {
        role: Role::User,
        content: mcp_protocol::ContentBlock::Text(mcp_protocol::TextContent {
            text: text.into(),
            _meta: None,
        }),
    }
}
