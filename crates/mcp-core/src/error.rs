//! The error taxonomy (spec.md §4.8, C8).
//!
//! Three numeric ranges share one domain: JSON-RPC standard codes, the
//! MCP server-reserved range, and library-internal kinds that never appear
//! on the wire. [`ErrorKind`] is the single classification used everywhere
//! in this workspace; [`McpError`] pairs it with a message and optional
//! context, mirroring `turbomcp-core::error::McpError` but dropping that
//! crate's `no_std`/`rich-errors` duality — nothing in this workspace runs
//! without `std` (see DESIGN.md).

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias used throughout the session engine.
pub type McpResult<T> = Result<T, McpError>;

/// Error classification for programmatic handling (spec.md §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    // --- JSON-RPC standard range ---
    /// Malformed JSON bytes (-32700). Reserved strictly for unparsable input
    /// per spec.md §4.1 — a well-formed object with a bad/missing `jsonrpc`
    /// field is `InvalidRequest`, not this.
    #[error("parse error")]
    ParseError,
    /// -32600.
    #[error("invalid request")]
    InvalidRequest,
    /// -32601.
    #[error("method not found")]
    MethodNotFound,
    /// -32602.
    #[error("invalid params")]
    InvalidParams,
    /// -32603.
    #[error("internal error")]
    InternalError,

    // --- MCP server-reserved range (-32000..-32099) ---
    /// -32000. The transport or session is gone; every pending request fails
    /// with this kind (spec.md §4.5.3 P3).
    #[error("connection closed")]
    ConnectionClosed,
    /// -32001.
    #[error("transport error")]
    TransportError,
    /// -32002.
    #[error("timeout")]
    Timeout,
    /// -32042.
    #[error("url elicitation required")]
    UrlElicitationRequired,

    // --- Library-internal kinds (never on the wire) ---
    /// Server replied with a `protocolVersion` we cannot negotiate.
    #[error("protocol version mismatch")]
    ProtocolVersionMismatch,
    /// A request was attempted outside `Ready`/`Initializing` (spec.md S1).
    #[error("session not initialized")]
    NotInitialized,
    /// `initialize` was invoked twice on the same session (spec.md S2).
    #[error("session already initialized")]
    AlreadyInitialized,
    /// No tool with the given name.
    #[error("tool not found")]
    ToolNotFound,
    /// No resource with the given URI.
    #[error("resource not found")]
    ResourceNotFound,
    /// No prompt with the given name.
    #[error("prompt not found")]
    PromptNotFound,
    /// No task with the given id.
    #[error("task not found")]
    TaskNotFound,
    /// The peer has not advertised the capability a call requires
    /// (spec.md §4.4, property 7 — checked before touching the wire).
    #[error("capability not supported")]
    CapabilityNotSupported,
}

impl ErrorKind {
    /// Map to the numeric JSON-RPC code emitted on the wire (spec.md §4.8
    /// "Mapping on emission"): `*NotFound` kinds become `MethodNotFound`,
    /// everything else library-internal becomes `InternalError`.
    #[must_use]
    pub const fn to_json_rpc_code(self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
            Self::ConnectionClosed => -32000,
            Self::TransportError => -32001,
            Self::Timeout => -32002,
            Self::UrlElicitationRequired => -32042,
            Self::ToolNotFound | Self::ResourceNotFound | Self::PromptNotFound | Self::TaskNotFound => {
                -32601
            }
            Self::ProtocolVersionMismatch
            | Self::NotInitialized
            | Self::AlreadyInitialized
            | Self::CapabilityNotSupported => -32603,
        }
    }

    /// Map a numeric JSON-RPC code back to the nearest kind (spec.md §4.8
    /// "On reception"). Unknown codes in the MCP server range collapse to
    /// `InternalError`, matching the spec's stated fallback.
    #[must_use]
    pub const fn from_json_rpc_code(code: i32) -> Self {
        match code {
            -32700 => Self::ParseError,
            -32600 => Self::InvalidRequest,
            -32601 => Self::MethodNotFound,
            -32602 => Self::InvalidParams,
            -32603 => Self::InternalError,
            -32000 => Self::ConnectionClosed,
            -32001 => Self::TransportError,
            -32002 => Self::Timeout,
            -32042 => Self::UrlElicitationRequired,
            code if (-32099..=-32000).contains(&code) => Self::InternalError,
            _ => Self::InternalError,
        }
    }
}

/// The single error type returned by every fallible operation in this
/// workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpError {
    /// Classification, used both for local `match`ing and wire mapping.
    pub kind: ErrorKind,
    /// Human-readable message. Never includes secrets; callers constructing
    /// errors from untrusted input should keep this in mind (see
    /// `McpError::internal` vs domain-specific constructors below).
    pub message: String,
    /// Optional structured data to attach to a JSON-RPC error's `data` field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl McpError {
    /// Build an error from a kind and message.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            data: None,
        }
    }

    /// Attach structured `data` (surfaced on the wire as `error.data`).
    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// The JSON-RPC error code this error maps to on the wire.
    #[must_use]
    pub const fn json_rpc_code(&self) -> i32 {
        self.kind.to_json_rpc_code()
    }

    /// Build an error from a raw JSON-RPC error code + message, as received
    /// from a peer's `ErrorResponse`.
    #[must_use]
    pub fn from_json_rpc(code: i32, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::from_json_rpc_code(code), message)
    }

    /// `-32601`.
    #[must_use]
    pub fn method_not_found(method: impl fmt::Display) -> Self {
        Self::new(ErrorKind::MethodNotFound, format!("method not found: {method}"))
    }

    /// `-32602`.
    #[must_use]
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParams, message)
    }

    /// `-32600`.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest, message)
    }

    /// `-32700`, reserved strictly for malformed bytes.
    #[must_use]
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseError, message)
    }

    /// `-32603`.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalError, message)
    }

    /// Library-internal: the session is not `Ready`/`Initializing`.
    #[must_use]
    pub fn not_initialized() -> Self {
        Self::new(ErrorKind::NotInitialized, "session is not initialized")
    }

    /// Library-internal: every pending request is failed with this on
    /// shutdown (spec.md §4.5.3 P3).
    #[must_use]
    pub fn connection_closed() -> Self {
        Self::new(ErrorKind::ConnectionClosed, "connection closed")
    }

    /// Library-internal: the peer did not advertise a required capability.
    #[must_use]
    pub fn capability_not_supported(capability: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::CapabilityNotSupported,
            format!("capability not supported: {capability}"),
        )
    }

    /// Library-internal tool lookup failure.
    #[must_use]
    pub fn tool_not_found(name: impl fmt::Display) -> Self {
        Self::new(ErrorKind::ToolNotFound, format!("tool not found: {name}"))
    }

    /// Library-internal resource lookup failure.
    #[must_use]
    pub fn resource_not_found(uri: impl fmt::Display) -> Self {
        Self::new(ErrorKind::ResourceNotFound, format!("resource not found: {uri}"))
    }

    /// Library-internal prompt lookup failure.
    #[must_use]
    pub fn prompt_not_found(name: impl fmt::Display) -> Self {
        Self::new(ErrorKind::PromptNotFound, format!("prompt not found: {name}"))
    }

    /// Library-internal task lookup failure.
    #[must_use]
    pub fn task_not_found(task_id: impl fmt::Display) -> Self {
        Self::new(ErrorKind::TaskNotFound, format!("task not found: {task_id}"))
    }
}

impl fmt::Display for McpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl std::error::Error for McpError {}

impl From<serde_json::Error> for McpError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_syntax() || err.is_eof() {
            Self::new(ErrorKind::ParseError, err.to_string())
        } else {
            Self::new(ErrorKind::InvalidParams, err.to_string())
        }
    }
}
