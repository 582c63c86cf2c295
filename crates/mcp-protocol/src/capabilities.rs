//! Capability bags and the `initialize` handshake payload shapes
//! (spec.md §3, §4.4, C4).
//!
//! Each capability category is modeled as `Option<...>` rather than a bare
//! bool: per spec.md §3 "a category is present iff enabled", so the wire
//! representation of "not supported" is the field's absence, not `false`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Peer identity exchanged during `initialize` (spec.md §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Implementation {
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "websiteUrl")]
    pub website_url: Option<String>,
}

impl Implementation {
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            title: None,
            website_url: None,
        }
    }
}

/// `listChanged`-only sub-capability, shared by tools/prompts/roots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListChangedCapability {
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub list_changed: bool,
}

/// Resources capability: `subscribe` and `listChanged` independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcesCapability {
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub subscribe: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not", default, rename = "listChanged")]
    pub list_changed: bool,
}

/// Capabilities a server advertises during `initialize` (spec.md §3).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompts: Option<ListChangedCapability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourcesCapability>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "tools")]
    pub tools: Option<ListChangedCapability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completions: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experimental: Option<HashMap<String, Value>>,
}

impl ServerCapabilities {
    /// Enable the `tools` category with the given `listChanged` flag,
    /// matching the entity-registry convention that adding the first tool
    /// implicitly enables this capability (spec.md §3).
    #[must_use]
    pub fn with_tools(mut self, list_changed: bool) -> Self {
        self.tools = Some(ListChangedCapability { list_changed });
        self
    }

    #[must_use]
    pub fn with_resources(mut self, subscribe: bool, list_changed: bool) -> Self {
        self.resources = Some(ResourcesCapability {
            subscribe,
            list_changed,
        });
        self
    }

    #[must_use]
    pub fn with_prompts(mut self, list_changed: bool) -> Self {
        self.prompts = Some(ListChangedCapability { list_changed });
        self
    }

    #[must_use]
    pub fn with_logging(mut self) -> Self {
        self.logging = Some(Value::Object(serde_json::Map::new()));
        self
    }

    #[must_use]
    pub fn supports_tools(&self) -> bool {
        self.tools.is_some()
    }

    #[must_use]
    pub fn supports_resources(&self) -> bool {
        self.resources.is_some()
    }

    #[must_use]
    pub fn supports_prompts(&self) -> bool {
        self.prompts.is_some()
    }

    #[must_use]
    pub fn supports_completions(&self) -> bool {
        self.completions.is_some()
    }
}

/// Capabilities a client advertises during `initialize` (spec.md §3).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampling: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roots: Option<ListChangedCapability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elicitation: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experimental: Option<HashMap<String, Value>>,
}

impl ClientCapabilities {
    #[must_use]
    pub fn with_sampling(mut self) -> Self {
        self.sampling = Some(Value::Object(serde_json::Map::new()));
        self
    }

    #[must_use]
    pub fn with_roots(mut self, list_changed: bool) -> Self {
        self.roots = Some(ListChangedCapability { list_changed });
        self
    }

    #[must_use]
    pub fn with_elicitation(mut self) -> Self {
        self.elicitation = Some(Value::Object(serde_json::Map::new()));
        self
    }

    #[must_use]
    pub fn supports_sampling(&self) -> bool {
        self.sampling.is_some()
    }

    #[must_use]
    pub fn supports_roots(&self) -> bool {
        self.roots.is_some()
    }

    #[must_use]
    pub fn supports_elicitation(&self) -> bool {
        self.elicitation.is_some()
    }
}

/// `initialize` request params (spec.md §4.4 step 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: String,
    pub client_info: Implementation,
    pub capabilities: ClientCapabilities,
}

/// `initialize` response result (spec.md §4.4 step 2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub server_info: Implementation,
    pub capabilities: ServerCapabilities,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn server_capabilities_round_trip() {
        let caps = ServerCapabilities::default()
            .with_tools(true)
            .with_resources(true, false)
            .with_logging();
        let json = serde_json::to_string(&caps).unwrap();
        let back: ServerCapabilities = serde_json::from_str(&json).unwrap();
        assert_eq!(caps, back);
    }

    #[test]
    fn disabled_categories_are_absent_not_false() {
        let caps = ServerCapabilities::default().with_tools(false);
        let value = serde_json::to_value(&caps).unwrap();
        assert!(value.get("resources").is_none());
        assert!(value.get("tools").unwrap().get("listChanged").is_none());
    }

    #[test]
    fn client_capabilities_round_trip() {
        let caps = ClientCapabilities::default().with_sampling().with_roots(true);
        let json = serde_json::to_string(&caps).unwrap();
        let back: ClientCapabilities = serde_json::from_str(&json).unwrap();
        assert_eq!(caps, back);
    }

    #[test]
    fn initialize_params_use_camel_case_on_wire() {
        let params = InitializeParams {
            protocol_version: "2025-06-18".to_string(),
            client_info: Implementation::new("test-client", "0.1.0"),
            capabilities: ClientCapabilities::default(),
        };
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["protocolVersion"], "2025-06-18");
        assert_eq!(value["clientInfo"]["name"], "test-client");
    }
}
