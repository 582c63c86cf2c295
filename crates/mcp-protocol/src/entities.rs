//! The MCP entity model (spec.md §4.3, C3): value types with JSON
//! round-trip as their only behavior. None of these types interpret their
//! own payloads — `Tool::input_schema` and friends stay opaque `Value`s,
//! per spec.md §1 ("semantic definitions of tool/resource/prompt entity
//! data" are out of scope for this crate).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::content::{ContentBlock, ResourceContents};

/// A named, schema-described callable exposed by a server (spec.md §2, C3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub input_schema: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
}

impl Tool {
    #[must_use]
    pub fn new(name: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            title: None,
            description: None,
            input_schema,
            output_schema: None,
        }
    }
}

/// Addressable read-only content identified by URI (spec.md GLOSSARY).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub uri: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl Resource {
    #[must_use]
    pub fn new(uri: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: name.into(),
            title: None,
            description: None,
            mime_type: None,
        }
    }
}

/// A URI pattern (RFC 6570) generating resources (spec.md GLOSSARY).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTemplate {
    pub uri_template: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// A parameter accepted by a [`Prompt`] (spec.md §2, C3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptArgument {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

/// A parameterized template producing a sequence of role-tagged messages
/// (spec.md GLOSSARY).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<PromptArgument>>,
}

/// Role tag shared by sampling and prompt messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single role-tagged message returned by `prompts/get` (spec.md §4.6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: ContentBlock,
}

/// Result of `prompts/get`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub messages: Vec<PromptMessage>,
}

/// Result of `tools/call` (spec.md §4.6): `is_error` distinguishes an
/// application-level tool failure (still a successful JSON-RPC response)
/// from a protocol-level error, which would be an `ErrorResponse` instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub content: Vec<ContentBlock>,
    pub is_error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
}

impl ToolResult {
    #[must_use]
    pub fn success(content: Vec<ContentBlock>) -> Self {
        Self {
            content,
            is_error: false,
            structured_content: None,
        }
    }

    #[must_use]
    pub fn error(content: Vec<ContentBlock>) -> Self {
        Self {
            content,
            is_error: true,
            structured_content: None,
        }
    }

    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::success(vec![ContentBlock::Text(crate::content::TextContent {
            text: text.into(),
            _meta: None,
        })])
    }
}

/// A `file://` boundary advertised by the client to the server (spec.md
/// §3, GLOSSARY).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Root {
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Lifecycle status of a long-running task (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Working,
    InputRequired,
    Completed,
    Failed,
    Cancelled,
}

/// A long-running, pollable tool invocation (spec.md §3, experimental).
///
/// Task ids double as the access-control boundary: whoever holds a task id
/// may poll or cancel it, so handler code must never leak one to a caller
/// other than the one that created it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub task_id: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    /// Milliseconds; `-1` means unlimited (spec.md §3).
    pub ttl: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval: Option<u64>,
}

impl Task {
    #[must_use]
    pub fn new(task_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Working,
            status_message: None,
            created_at: now,
            last_updated_at: now,
            ttl: -1,
            poll_interval: None,
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

/// A hint nudging `sampling/createMessage` toward a particular model family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelHint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Soft constraints on model selection for a sampling request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPreferences {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hints: Option<Vec<ModelHint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_priority: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_priority: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intelligence_priority: Option<f64>,
}

/// One message in a `sampling/createMessage` conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingMessage {
    pub role: Role,
    pub content: ContentBlock,
}

/// Result of a server-issued `sampling/createMessage` request (spec.md
/// §4.6, role reversal).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingResult {
    pub role: Role,
    pub content: ContentBlock,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
}

/// The inner `completion` payload of a `completion/complete` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionValues {
    pub values: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_more: Option<bool>,
}

/// Result of `completion/complete`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResult {
    pub completion: CompletionValues,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::TextContent;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn round_trips<T>(value: &T)
    where
        T: Serialize + for<'de> Deserialize<'de> + PartialEq + std::fmt::Debug,
    {
        let json = serde_json::to_string(value).unwrap();
        let back: T = serde_json::from_str(&json).unwrap();
        assert_eq!(value, &back);
    }

    #[test]
    fn tool_round_trips() {
        round_trips(&Tool::new("add", serde_json::json!({"type": "object"})));
    }

    #[test]
    fn resource_round_trips() {
        round_trips(&Resource::new("test://hello", "hello"));
    }

    #[test]
    fn resource_template_round_trips() {
        round_trips(&ResourceTemplate {
            uri_template: "test://{id}".to_string(),
            name: "templated".to_string(),
            title: None,
            description: None,
            mime_type: None,
        });
    }

    #[test]
    fn prompt_round_trips() {
        round_trips(&Prompt {
            name: "greeting".to_string(),
            title: None,
            description: None,
            arguments: Some(vec![PromptArgument {
                name: "subject".to_string(),
                description: None,
                required: Some(true),
            }]),
        });
    }

    #[test]
    fn tool_result_round_trips() {
        round_trips(&ToolResult::text("8"));
    }

    #[test]
    fn prompt_result_round_trips() {
        round_trips(&PromptResult {
            description: None,
            messages: vec![PromptMessage {
                role: Role::Assistant,
                content: ContentBlock::Text(TextContent {
                    text: "Hello, Claude!".to_string(),
                    _meta: None,
                }),
            }],
        });
    }

    #[test]
    fn root_round_trips() {
        round_trips(&Root {
            uri: "file:///tmp".to_string(),
            name: Some("tmp".to_string()),
        });
    }

    #[test]
    fn task_round_trips() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        round_trips(&Task::new("task-1", now));
    }

    #[test]
    fn task_status_uses_snake_case_on_wire() {
        let value = serde_json::to_value(TaskStatus::InputRequired).unwrap();
        assert_eq!(value, "input_required");
    }

    #[test]
    fn model_preferences_round_trips() {
        round_trips(&ModelPreferences {
            hints: Some(vec![ModelHint {
                name: Some("claude".to_string()),
            }]),
            cost_priority: Some(0.5),
            speed_priority: None,
            intelligence_priority: None,
        });
    }

    #[test]
    fn sampling_result_round_trips() {
        round_trips(&SamplingResult {
            role: Role::Assistant,
            content: ContentBlock::Text(TextContent {
                text: "hi".to_string(),
                _meta: None,
            }),
            model: "claude".to_string(),
            stop_reason: Some("endTurn".to_string()),
        });
    }

    #[test]
    fn completion_result_round_trips() {
        round_trips(&CompletionResult {
            completion: CompletionValues {
                values: vec!["a".to_string(), "b".to_string()],
                total: Some(2),
                has_more: Some(false),
            },
        });
    }
}
