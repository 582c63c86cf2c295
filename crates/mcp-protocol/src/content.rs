//! Content items carried by `ToolResult` and `PromptMessage` (spec.md §4.3).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One item of an ordered content sequence. Tagged by `type` on the wire;
/// the codec preserves item order (spec.md §4.3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text(TextContent),
    Image(ImageContent),
    Audio(AudioContent),
    Resource(EmbeddedResourceContent),
    ResourceLink(ResourceLink),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _meta: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageContent {
    /// Base64-encoded image bytes.
    pub data: String,
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _meta: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioContent {
    /// Base64-encoded audio bytes.
    pub data: String,
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _meta: Option<Value>,
}

/// A reference to a resource without inlining its contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceLink {
    pub uri: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A content item carrying a resource's contents inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedResourceContent {
    pub resource: ResourceContents,
}

/// Resource body: a tagged union over text vs. binary (spec.md §4.3) —
/// exactly one of `text`/`blob` is present, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceContents {
    Text {
        uri: String,
        #[serde(skip_serializing_if = "Option::is_none", rename = "mimeType")]
        mime_type: Option<String>,
        text: String,
    },
    Blob {
        uri: String,
        #[serde(skip_serializing_if = "Option::is_none", rename = "mimeType")]
        mime_type: Option<String>,
        /// Base64-encoded binary contents.
        blob: String,
    },
}

impl ResourceContents {
    #[must_use]
    pub fn text(uri: impl Into<String>, mime_type: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Text {
            uri: uri.into(),
            mime_type: Some(mime_type.into()),
            text: text.into(),
        }
    }

    #[must_use]
    pub fn uri(&self) -> &str {
        match self {
            Self::Text { uri, .. } | Self::Blob { uri, .. } => uri,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn content_block_sequence_preserves_order() {
        let blocks = vec![
            ContentBlock::Text(TextContent {
                text: "first".to_string(),
                _meta: None,
            }),
            ContentBlock::Text(TextContent {
                text: "second".to_string(),
                _meta: None,
            }),
        ];
        let json = serde_json::to_string(&blocks).unwrap();
        let back: Vec<ContentBlock> = serde_json::from_str(&json).unwrap();
        assert_eq!(blocks, back);
    }

    #[test]
    fn resource_contents_text_round_trips() {
        let contents = ResourceContents::text("test://hello", "text/plain", "Hello from test resource!");
        let json = serde_json::to_string(&contents).unwrap();
        let back: ResourceContents = serde_json::from_str(&json).unwrap();
        assert_eq!(contents, back);
    }

    #[test]
    fn resource_contents_blob_has_no_text_field() {
        let contents = ResourceContents::Blob {
            uri: "test://bin".to_string(),
            mime_type: Some("application/octet-stream".to_string()),
            blob: "AAAA".to_string(),
        };
        let value = serde_json::to_value(&contents).unwrap();
        assert!(value.get("text").is_none());
        assert!(value.get("blob").is_some());
    }
}
