//! The client-role dispatcher (spec.md §4.6, C6): a thin layer over
//! [`mcp_session::Session`] that drives the `initialize` handshake, issues
//! the MCP server-side methods with capability gating, and registers
//! handlers for the server-to-client role-reversal requests.

use std::sync::{Arc, RwLock};

use mcp_core::{methods, McpError, McpResult, PROTOCOL_VERSION};
use mcp_protocol::{ClientCapabilities, Implementation, InitializeParams, InitializeResult, ServerCapabilities};
use mcp_session::{request_handler, Session};
use mcp_transport::Transport;
use serde_json::{json, Value};

use crate::handlers::{ElicitationHandler, RootsProvider, SamplingHandler};

struct ClientInner {
    session: Session,
    info: Implementation,
    sampling_handler: Option<Arc<dyn SamplingHandler>>,
    roots_provider: Option<Arc<dyn RootsProvider>>,
    elicitation_handler: Option<Arc<dyn ElicitationHandler>>,
    remote_server_info: RwLock<Option<Implementation>>,
    remote_server_capabilities: RwLock<ServerCapabilities>,
}

/// An MCP client. Cheap to clone (shares state with every clone), mirroring
/// [`mcp_session::Session`].
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

/// Builds a [`Client`] with optional server-to-client handlers registered
/// before the first `connect()`. Handler presence at build time decides
/// which capabilities the client advertises during `initialize` (spec.md
/// §3: `ClientCapabilities`), mirroring
/// `turbomcp-client/src/client/builder.rs`'s builder pattern.
pub struct ClientBuilder {
    info: Implementation,
    sampling_handler: Option<Arc<dyn SamplingHandler>>,
    roots_provider: Option<Arc<dyn RootsProvider>>,
    elicitation_handler: Option<Arc<dyn ElicitationHandler>>,
}

impl ClientBuilder {
    #[must_use]
    pub fn new(info: Implementation) -> Self {
        Self {
            info,
            sampling_handler: None,
            roots_provider: None,
            elicitation_handler: None,
        }
    }

    #[must_use]
    pub fn with_sampling_handler(mut self, handler: Arc<dyn SamplingHandler>) -> Self {
        self.sampling_handler = Some(handler);
        self
    }

    #[must_use]
    pub fn with_roots_provider(mut self, provider: Arc<dyn RootsProvider>) -> Self {
        self.roots_provider = Some(provider);
        self
    }

    #[must_use]
    pub fn with_elicitation_handler(mut self, handler: Arc<dyn ElicitationHandler>) -> Self {
        self.elicitation_handler = Some(handler);
        self
    }

    #[must_use]
    pub fn build(self) -> Client {
        Client {
            inner: Arc::new(ClientInner {
                session: Session::new(),
                info: self.info,
                sampling_handler: self.sampling_handler,
                roots_provider: self.roots_provider,
                elicitation_handler: self.elicitation_handler,
                remote_server_info: RwLock::new(None),
                remote_server_capabilities: RwLock::new(ServerCapabilities::default()),
            }),
        }
    }
}

impl Client {
    #[must_use]
    pub fn new(info: Implementation) -> Self {
        ClientBuilder::new(info).build()
    }

    /// The underlying session engine, for transport wiring and for
    /// registering handlers for the server notification set
    /// (`notifications/tools/list_changed` and friends — spec.md §6).
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// The capabilities this client currently advertises, derived from
    /// which server-to-client handlers have been registered (spec.md §3,
    /// mirrored from `Server::capabilities`'s registry-occupancy rule).
    #[must_use]
    pub fn advertised_capabilities(&self) -> ClientCapabilities {
        let mut caps = ClientCapabilities::default();
        if self.inner.sampling_handler.is_some() {
            caps = caps.with_sampling();
        }
        if self.inner.roots_provider.is_some() {
            caps = caps.with_roots(true);
        }
        if self.inner.elicitation_handler.is_some() {
            caps = caps.with_elicitation();
        }
        caps
    }

    #[must_use]
    pub fn remote_server_info(&self) -> Option<Implementation> {
        self.inner.remote_server_info.read().unwrap().clone()
    }

    #[must_use]
    pub fn remote_capabilities(&self) -> ServerCapabilities {
        self.inner.remote_server_capabilities.read().unwrap().clone()
    }

    /// Start the session against `transport` and drive the full
    /// `initialize` handshake (spec.md §4.4): send `initialize`, store the
    /// server's reply, then send `notifications/initialized`, after which
    /// the session is `Ready`.
    ///
    /// # Errors
    /// Whatever [`Session::start`]/`send_request` return, or
    /// `ProtocolVersionMismatch` if the server's negotiated version isn't
    /// one this workspace recognizes.
    pub async fn connect<T>(&self, transport: T) -> McpResult<InitializeResult>
    where
        T: Transport + 'static,
    {
        self.register_handlers();
        self.inner.session.start(transport).await?;

        let params = InitializeParams {
            protocol_version: PROTOCOL_VERSION.to_string(),
            client_info: self.inner.info.clone(),
            capabilities: self.advertised_capabilities(),
        };
        let value = self
            .inner
            .session
            .send_request(methods::INITIALIZE, Some(serde_json::to_value(params)?))
            .await?;
        let result: InitializeResult = serde_json::from_value(value).map_err(McpError::from)?;

        if !mcp_core::SUPPORTED_VERSIONS.contains(&result.protocol_version.as_str()) {
            return Err(McpError::new(
                mcp_core::ErrorKind::ProtocolVersionMismatch,
                format!("server offered unsupported protocol version {}", result.protocol_version),
            ));
        }

        *self.inner.remote_server_info.write().unwrap() = Some(result.server_info.clone());
        *self.inner.remote_server_capabilities.write().unwrap() = result.capabilities.clone();

        self.inner.session.complete_initialization()?;
        Ok(result)
    }

    /// # Errors
    /// Whatever [`Session::stop`] returns.
    pub async fn stop(&self) -> McpResult<()> {
        self.inner.session.stop().await
    }

    fn register_handlers(&self) {
        let session = self.inner.session.clone();

        if let Some(handler) = self.inner.sampling_handler.clone() {
            session.register_request_handler(
                methods::CREATE_MESSAGE,
                request_handler(move |params, _ctx| {
                    let handler = handler.clone();
                    async move { Self::handle_create_message(&*handler, params).await }
                }),
            );
        }

        if let Some(provider) = self.inner.roots_provider.clone() {
            session.register_request_handler(
                methods::LIST_ROOTS,
                request_handler(move |_params, _ctx| {
                    let provider = provider.clone();
                    async move {
                        let roots = provider.list_roots().await?;
                        Ok(json!({ "roots": roots }))
                    }
                }),
            );
        }

        if let Some(handler) = self.inner.elicitation_handler.clone() {
            session.register_request_handler(
                methods::ELICIT,
                request_handler(move |params, _ctx| {
                    let handler = handler.clone();
                    async move { Self::handle_elicit(&*handler, params).await }
                }),
            );
        }
    }

    async fn handle_create_message(handler: &dyn SamplingHandler, params: Option<Value>) -> McpResult<Value> {
        let params = params.ok_or_else(|| McpError::invalid_params("sampling/createMessage requires params"))?;
        let messages = serde_json::from_value(
            params
                .get("messages")
                .cloned()
                .ok_or_else(|| McpError::invalid_params("missing \"messages\""))?,
        )
        .map_err(McpError::from)?;
        let model_preferences = params
            .get("modelPreferences")
            .cloned()
            .filter(|v| !v.is_null())
            .map(serde_json::from_value)
            .transpose()
            .map_err(McpError::from)?;
        let max_tokens = params.get("maxTokens").and_then(Value::as_u64).unwrap_or(0) as u32;
        let result = handler.create_message(messages, model_preferences, max_tokens).await?;
        serde_json::to_value(result).map_err(McpError::from)
    }

    async fn handle_elicit(handler: &dyn ElicitationHandler, params: Option<Value>) -> McpResult<Value> {
        let params = params.ok_or_else(|| McpError::invalid_params("elicitation/create requires params"))?;
        let message = params
            .get("message")
            .and_then(Value::as_str)
            .ok_or_else(|| McpError::invalid_params("missing \"message\""))?
            .to_string();
        let schema = params.get("requestedSchema").cloned().unwrap_or(Value::Null);
        handler.elicit(message, schema).await
    }

    fn require_capability(&self, supported: bool, name: &str) -> McpResult<()> {
        if supported {
            Ok(())
        } else {
            Err(McpError::capability_not_supported(name))
        }
    }

    /// # Errors
    /// `CapabilityNotSupported` if the server never advertised `tools`;
    /// otherwise whatever `tools/list` returns.
    pub async fn list_tools(&self) -> McpResult<Vec<mcp_protocol::Tool>> {
        self.require_capability(self.remote_capabilities().supports_tools(), "tools")?;
        let result = self.inner.session.send_request(methods::LIST_TOOLS, None).await?;
        let tools = result.get("tools").cloned().unwrap_or(Value::Array(vec![]));
        serde_json::from_value(tools).map_err(McpError::from)
    }

    /// # Errors
    /// `CapabilityNotSupported` if the server never advertised `tools`;
    /// otherwise whatever `tools/call` returns.
    pub async fn call_tool(&self, name: impl Into<String>, arguments: Option<Value>) -> McpResult<mcp_protocol::ToolResult> {
        self.require_capability(self.remote_capabilities().supports_tools(), "tools")?;
        let params = json!({ "name": name.into(), "arguments": arguments });
        let result = self.inner.session.send_request(methods::CALL_TOOL, Some(params)).await?;
        serde_json::from_value(result).map_err(McpError::from)
    }

    /// # Errors
    /// `CapabilityNotSupported` if the server never advertised `resources`.
    pub async fn list_resources(&self) -> McpResult<Vec<mcp_protocol::Resource>> {
        self.require_capability(self.remote_capabilities().supports_resources(), "resources")?;
        let result = self.inner.session.send_request(methods::LIST_RESOURCES, None).await?;
        let resources = result.get("resources").cloned().unwrap_or(Value::Array(vec![]));
        serde_json::from_value(resources).map_err(McpError::from)
    }

    /// # Errors
    /// `CapabilityNotSupported` if the server never advertised `resources`.
    pub async fn list_resource_templates(&self) -> McpResult<Vec<mcp_protocol::ResourceTemplate>> {
        self.require_capability(self.remote_capabilities().supports_resources(), "resources")?;
        let result = self
            .inner
            .session
            .send_request(methods::LIST_RESOURCE_TEMPLATES, None)
            .await?;
        let templates = result.get("resourceTemplates").cloned().unwrap_or(Value::Array(vec![]));
        serde_json::from_value(templates).map_err(McpError::from)
    }

    /// # Errors
    /// `CapabilityNotSupported` if the server never advertised `resources`.
    pub async fn read_resource(&self, uri: impl Into<String>) -> McpResult<Vec<mcp_protocol::ResourceContents>> {
        self.require_capability(self.remote_capabilities().supports_resources(), "resources")?;
        let result = self
            .inner
            .session
            .send_request(methods::READ_RESOURCE, Some(json!({ "uri": uri.into() })))
            .await?;
        let contents = result.get("contents").cloned().unwrap_or(Value::Array(vec![]));
        serde_json::from_value(contents).map_err(McpError::from)
    }

    /// # Errors
    /// `CapabilityNotSupported` if the server doesn't advertise
    /// `resources.subscribe`.
    pub async fn subscribe_resource(&self, uri: impl Into<String>) -> McpResult<()> {
        let subscribe_supported = self
            .remote_capabilities()
            .resources
            .map(|r| r.subscribe)
            .unwrap_or(false);
        self.require_capability(subscribe_supported, "resources.subscribe")?;
        self.inner
            .session
            .send_request(methods::SUBSCRIBE_RESOURCE, Some(json!({ "uri": uri.into() })))
            .await?;
        Ok(())
    }

    /// # Errors
    /// Whatever `resources/unsubscribe` returns.
    pub async fn unsubscribe_resource(&self, uri: impl Into<String>) -> McpResult<()> {
        self.inner
            .session
            .send_request(methods::UNSUBSCRIBE_RESOURCE, Some(json!({ "uri": uri.into() })))
            .await?;
        Ok(())
    }

    /// # Errors
    /// `CapabilityNotSupported` if the server never advertised `prompts`.
    pub async fn list_prompts(&self) -> McpResult<Vec<mcp_protocol::Prompt>> {
        self.require_capability(self.remote_capabilities().supports_prompts(), "prompts")?;
        let result = self.inner.session.send_request(methods::LIST_PROMPTS, None).await?;
        let prompts = result.get("prompts").cloned().unwrap_or(Value::Array(vec![]));
        serde_json::from_value(prompts).map_err(McpError::from)
    }

    /// # Errors
    /// `CapabilityNotSupported` if the server never advertised `prompts`.
    pub async fn get_prompt(
        &self,
        name: impl Into<String>,
        arguments: Option<Value>,
    ) -> McpResult<mcp_protocol::PromptResult> {
        self.require_capability(self.remote_capabilities().supports_prompts(), "prompts")?;
        let params = json!({ "name": name.into(), "arguments": arguments });
        let result = self.inner.session.send_request(methods::GET_PROMPT, Some(params)).await?;
        serde_json::from_value(result).map_err(McpError::from)
    }

    /// # Errors
    /// `CapabilityNotSupported` if the server never advertised
    /// `completions`.
    pub async fn complete(&self, params: Value) -> McpResult<mcp_protocol::CompletionResult> {
        self.require_capability(self.remote_capabilities().supports_completions(), "completions")?;
        let result = self.inner.session.send_request(methods::COMPLETE, Some(params)).await?;
        serde_json::from_value(result).map_err(McpError::from)
    }

    /// # Errors
    /// Whatever `ping` returns.
    pub async fn ping(&self) -> McpResult<()> {
        self.inner.session.send_request(methods::PING, None).await?;
        Ok(())
    }

    /// # Errors
    /// Whatever `logging/setLevel` returns.
    pub async fn set_log_level(&self, level: impl Into<String>) -> McpResult<()> {
        self.inner
            .session
            .send_request(methods::SET_LOG_LEVEL, Some(json!({ "level": level.into() })))
            .await?;
        Ok(())
    }

    /// # Errors
    /// Whatever `tasks/get` returns.
    pub async fn get_task(&self, task_id: impl Into<String>) -> McpResult<mcp_protocol::Task> {
        let result = self
            .inner
            .session
            .send_request(methods::GET_TASK, Some(json!({ "taskId": task_id.into() })))
            .await?;
        serde_json::from_value(result).map_err(McpError::from)
    }

    /// # Errors
    /// Whatever `tasks/cancel` returns.
    pub async fn cancel_task(&self, task_id: impl Into<String>) -> McpResult<mcp_protocol::Task> {
        let result = self
            .inner
            .session
            .send_request(methods::CANCEL_TASK, Some(json!({ "taskId": task_id.into() })))
            .await?;
        serde_json::from_value(result).map_err(McpError::from)
    }
}
