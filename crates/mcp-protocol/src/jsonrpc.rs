//! JSON-RPC 2.0 message codec (spec.md §4.1, C1).
//!
//! Messages are modeled as four distinct Rust types rather than one struct
//! with optional fields, so a `Notification` can't accidentally carry an
//! `id` and a `Response` can't accidentally carry a `method` — the codec's
//! job is exactly to pick the right one of these four on decode and to
//! avoid writing absent fields on encode (spec.md §4.1).

use mcp_core::{ErrorKind, McpError, RequestId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The literal JSON-RPC version string every message carries.
pub const JSONRPC_VERSION: &str = "2.0";

/// An outbound or inbound JSON-RPC request.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub id: RequestId,
    pub method: String,
    pub params: Option<Value>,
}

/// A successful JSON-RPC response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub id: RequestId,
    pub result: Value,
}

/// A JSON-RPC error object, embedded in [`ErrorResponse`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl From<&McpError> for ErrorObject {
    fn from(err: &McpError) -> Self {
        Self {
            code: err.json_rpc_code(),
            message: err.message.clone(),
            data: err.data.clone(),
        }
    }
}

impl From<McpError> for ErrorObject {
    fn from(err: McpError) -> Self {
        Self::from(&err)
    }
}

/// A failed JSON-RPC response. `id` is `None` only for parse errors
/// (spec.md §3, Response variant note).
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorResponse {
    pub id: Option<RequestId>,
    pub error: ErrorObject,
}

/// A fire-and-forget JSON-RPC message: no `id`, no reply expected.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub method: String,
    pub params: Option<Value>,
}

/// The sum type over the four JSON-RPC message shapes (spec.md §3).
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Request(Request),
    Response(Response),
    ErrorResponse(ErrorResponse),
    Notification(Notification),
}

impl Message {
    /// Build a request message.
    #[must_use]
    pub fn request(id: impl Into<RequestId>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self::Request(Request {
            id: id.into(),
            method: method.into(),
            params,
        })
    }

    /// Build a successful response.
    #[must_use]
    pub fn response(id: RequestId, result: Value) -> Self {
        Self::Response(Response { id, result })
    }

    /// Build an error response carrying a recoverable id.
    #[must_use]
    pub fn error_response(id: RequestId, error: impl Into<ErrorObject>) -> Self {
        Self::ErrorResponse(ErrorResponse {
            id: Some(id),
            error: error.into(),
        })
    }

    /// Build an error response with no recoverable id, reserved for
    /// top-level parse failures (spec.md §4.5.4, point 4).
    #[must_use]
    pub fn parse_error_response(error: impl Into<ErrorObject>) -> Self {
        Self::ErrorResponse(ErrorResponse {
            id: None,
            error: error.into(),
        })
    }

    /// Build a notification.
    #[must_use]
    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        Self::Notification(Notification {
            method: method.into(),
            params,
        })
    }

    /// Encode this message as a single-line JSON-RPC envelope (spec.md
    /// §4.1 encode): absent fields are never written.
    ///
    /// # Errors
    /// Returns `McpError::internal` only if the contained `params`/`result`
    /// values are somehow not serializable, which cannot happen for
    /// `serde_json::Value` but is threaded through for symmetry with
    /// [`Message::decode`].
    pub fn encode(&self) -> Result<String, McpError> {
        let value = self.to_value();
        serde_json::to_string(&value).map_err(McpError::from)
    }

    /// Build the `serde_json::Value` this message encodes to, without
    /// stringifying — used by transports that want to frame the bytes
    /// themselves (e.g. appending a newline).
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("jsonrpc".to_string(), Value::String(JSONRPC_VERSION.to_string()));

        match self {
            Self::Request(req) => {
                map.insert("id".to_string(), id_to_value(&req.id));
                map.insert("method".to_string(), Value::String(req.method.clone()));
                if let Some(params) = &req.params {
                    map.insert("params".to_string(), params.clone());
                }
            }
            Self::Response(resp) => {
                map.insert("id".to_string(), id_to_value(&resp.id));
                map.insert("result".to_string(), resp.result.clone());
            }
            Self::ErrorResponse(err) => {
                map.insert(
                    "id".to_string(),
                    err.id.as_ref().map_or(Value::Null, id_to_value),
                );
                map.insert(
                    "error".to_string(),
                    serde_json::to_value(&err.error).unwrap_or(Value::Null),
                );
            }
            Self::Notification(note) => {
                map.insert("method".to_string(), Value::String(note.method.clone()));
                if let Some(params) = &note.params {
                    map.insert("params".to_string(), params.clone());
                }
            }
        }

        Value::Object(map)
    }

    /// Decode a single JSON-RPC envelope (spec.md §4.1 decode).
    ///
    /// # Errors
    /// Returns an `McpError` with kind `ParseError` if `bytes` is not valid
    /// JSON, or `InvalidRequest` if it is valid JSON but not a recognizable
    /// JSON-RPC 2.0 envelope (missing/wrong `jsonrpc` literal, or a shape
    /// matching none of Request/Response/ErrorResponse/Notification).
    pub fn decode(bytes: &str) -> Result<Self, McpError> {
        let value: Value =
            serde_json::from_str(bytes).map_err(|e| McpError::new(ErrorKind::ParseError, e.to_string()))?;
        Self::from_value(value)
    }

    /// Decode an already-parsed JSON value (spec.md §4.1 decode).
    ///
    /// # Errors
    /// Returns `InvalidRequest` for anything that isn't a recognizable
    /// JSON-RPC 2.0 envelope.
    pub fn from_value(value: Value) -> Result<Self, McpError> {
        let Value::Object(map) = value else {
            return Err(McpError::invalid_request("JSON-RPC message must be an object"));
        };

        match map.get("jsonrpc") {
            Some(Value::String(v)) if v == JSONRPC_VERSION => {}
            _ => return Err(McpError::invalid_request("missing or invalid \"jsonrpc\" field")),
        }

        let has_method = map.contains_key("method");
        let has_id = map.contains_key("id") && !matches!(map.get("id"), Some(Value::Null));

        if has_method && has_id {
            let id = parse_id(map.get("id"))?.ok_or_else(|| {
                McpError::invalid_request("request id must not be null")
            })?;
            let method = parse_method(&map)?;
            let params = map.get("params").cloned();
            return Ok(Self::Request(Request { id, method, params }));
        }

        if has_method && !has_id {
            let method = parse_method(&map)?;
            let params = map.get("params").cloned();
            return Ok(Self::Notification(Notification { method, params }));
        }

        if map.contains_key("id") && map.contains_key("result") {
            let id = parse_id(map.get("id"))?
                .ok_or_else(|| McpError::invalid_request("response id must not be null"))?;
            let result = map.get("result").cloned().unwrap_or(Value::Null);
            return Ok(Self::Response(Response { id, result }));
        }

        if map.contains_key("id") && map.contains_key("error") {
            let id = parse_id(map.get("id"))?;
            let error_value = map
                .get("error")
                .cloned()
                .ok_or_else(|| McpError::invalid_request("missing \"error\" field"))?;
            let error: ErrorObject = serde_json::from_value(error_value)
                .map_err(|e| McpError::invalid_request(format!("invalid error object: {e}")))?;
            return Ok(Self::ErrorResponse(ErrorResponse { id, error }));
        }

        Err(McpError::invalid_request(
            "object does not match Request, Response, ErrorResponse or Notification",
        ))
    }

    /// The method name, for `Request`/`Notification`; `None` otherwise.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Request(r) => Some(&r.method),
            Self::Notification(n) => Some(&n.method),
            Self::Response(_) | Self::ErrorResponse(_) => None,
        }
    }
}

fn parse_method(map: &Map<String, Value>) -> Result<String, McpError> {
    match map.get("method") {
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(McpError::invalid_request("missing or invalid \"method\" field")),
    }
}

fn parse_id(value: Option<&Value>) -> Result<Option<RequestId>, McpError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(RequestId::from(s.as_str()))),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(|n| Some(RequestId::from(n)))
            .ok_or_else(|| McpError::invalid_request("id number out of range")),
        Some(_) => Err(McpError::invalid_request("id must be a string or integer")),
    }
}

fn id_to_value(id: &RequestId) -> Value {
    match id {
        RequestId::String(s) => Value::String(s.clone()),
        RequestId::Number(n) => Value::Number((*n).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn encodes_request_without_null_params() {
        let msg = Message::request(1i64, "ping", None);
        let value = msg.to_value();
        assert!(!value.as_object().unwrap().contains_key("params"));
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["id"], 1);
    }

    #[test]
    fn encodes_notification_without_id() {
        let msg = Message::notification("notifications/initialized", None);
        let value = msg.to_value();
        assert!(!value.as_object().unwrap().contains_key("id"));
    }

    #[test]
    fn decodes_request_with_string_id() {
        let raw = r#"{"jsonrpc":"2.0","id":"abc","method":"tools/list","params":{}}"#;
        let msg = Message::decode(raw).unwrap();
        match msg {
            Message::Request(r) => {
                assert_eq!(r.id, RequestId::from("abc"));
                assert_eq!(r.method, "tools/list");
            }
            other => panic!("expected Request, got {other:?}"),
        }
    }

    #[test]
    fn decodes_notification_without_id() {
        let raw = r#"{"jsonrpc":"2.0","method":"notifications/cancelled","params":{"requestId":"1"}}"#;
        let msg = Message::decode(raw).unwrap();
        assert!(matches!(msg, Message::Notification(_)));
    }

    #[test]
    fn decodes_response_and_error_response() {
        let resp = Message::decode(r#"{"jsonrpc":"2.0","id":1,"result":{}}"#).unwrap();
        assert!(matches!(resp, Message::Response(_)));

        let err = Message::decode(r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"nope"}}"#).unwrap();
        match err {
            Message::ErrorResponse(e) => {
                assert_eq!(e.id, Some(RequestId::from(1i64)));
                assert_eq!(e.error.code, -32601);
            }
            other => panic!("expected ErrorResponse, got {other:?}"),
        }
    }

    #[test]
    fn missing_jsonrpc_field_is_invalid_request_not_parse_error() {
        let err = Message::decode(r#"{"id":1,"method":"ping"}"#).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidRequest);
    }

    #[test]
    fn malformed_json_bytes_is_parse_error() {
        let err = Message::decode("{not json").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ParseError);
    }

    #[test]
    fn shape_matching_nothing_is_invalid_request() {
        let err = Message::decode(r#"{"jsonrpc":"2.0"}"#).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidRequest);
    }

    #[test]
    fn round_trips_through_encode_decode() {
        let original = Message::request(42i64, "ping", Some(json!({"x": 1})));
        let bytes = original.encode().unwrap();
        let decoded = Message::decode(&bytes).unwrap();
        assert_eq!(original, decoded);
    }
}
