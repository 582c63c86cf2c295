//! The server-role dispatcher (spec.md §4.6, C6): a thin layer over
//! [`mcp_session::Session`] that registers handlers for the MCP server
//! method set, owns the entity registries, and exposes a typed
//! registration + call surface. Mirrors how `turbomcp-server`'s router
//! wires method names to handler implementations, but against this
//! workspace's own session engine rather than the teacher's `McpHandler`.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use mcp_core::{methods, McpError, McpResult, PROTOCOL_VERSION, SUPPORTED_VERSIONS};
use mcp_protocol::{
    ClientCapabilities, Implementation, InitializeParams, InitializeResult, Prompt, Resource, ResourceContents,
    ResourceTemplate, ServerCapabilities, Tool,
};
use mcp_session::{request_handler, HandlerContext, Session};
use mcp_transport::Transport;
use serde_json::{json, Value};
use tracing::debug;

use crate::handlers::{CompletionHandler, PromptHandler, ResourceHandler, ToolHandler};
use crate::registry::OrderedRegistry;
use crate::tasks::TaskStore;

struct ToolEntry {
    tool: Tool,
    handler: Arc<dyn ToolHandler>,
}

struct ResourceEntry {
    resource: Resource,
    handler: Arc<dyn ResourceHandler>,
}

struct TemplateEntry {
    template: ResourceTemplate,
    handler: Arc<dyn ResourceHandler>,
}

struct PromptEntry {
    prompt: Prompt,
    handler: Arc<dyn PromptHandler>,
}

struct ServerInner {
    session: Session,
    info: Implementation,
    instructions: Option<String>,
    tools: OrderedRegistry<ToolEntry>,
    resources: OrderedRegistry<ResourceEntry>,
    templates: OrderedRegistry<TemplateEntry>,
    prompts: OrderedRegistry<PromptEntry>,
    completion_handler: RwLock<Option<Arc<dyn CompletionHandler>>>,
    tasks: TaskStore,
    subscriptions: RwLock<HashSet<String>>,
    remote_client_capabilities: RwLock<ClientCapabilities>,
    remote_client_info: RwLock<Option<Implementation>>,
}

/// An MCP server: the entity registries plus the session they're exposed
/// over. Cheap to clone (shares state with every clone), mirroring
/// [`mcp_session::Session`]'s own clone semantics.
#[derive(Clone)]
pub struct Server {
    inner: Arc<ServerInner>,
}

impl Server {
    #[must_use]
    pub fn new(info: Implementation) -> Self {
        Self {
            inner: Arc::new(ServerInner {
                session: Session::new(),
                info,
                instructions: None,
                tools: OrderedRegistry::default(),
                resources: OrderedRegistry::default(),
                templates: OrderedRegistry::default(),
                prompts: OrderedRegistry::default(),
                completion_handler: RwLock::new(None),
                tasks: TaskStore::default(),
                subscriptions: RwLock::new(HashSet::new()),
                remote_client_capabilities: RwLock::new(ClientCapabilities::default()),
                remote_client_info: RwLock::new(None),
            }),
        }
    }

    #[must_use]
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        Arc::get_mut(&mut self.inner)
            .expect("with_instructions must run before the server is cloned/shared")
            .instructions = Some(instructions.into());
        self
    }

    /// The underlying session engine, for transport wiring and state
    /// observation.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    #[must_use]
    pub fn task_store(&self) -> &TaskStore {
        &self.inner.tasks
    }

    /// Register a tool. Implicitly enables the `tools` server capability
    /// (spec.md §3) and, once the session is `Ready`, emits
    /// `notifications/tools/list_changed`.
    pub fn add_tool(&self, tool: Tool, handler: Arc<dyn ToolHandler>) {
        let name = tool.name.clone();
        self.inner.tools.insert(name, ToolEntry { tool, handler });
        self.notify_if_ready(methods::TOOLS_LIST_CHANGED);
    }

    pub fn add_resource(&self, resource: Resource, handler: Arc<dyn ResourceHandler>) {
        let uri = resource.uri.clone();
        self.inner.resources.insert(uri, ResourceEntry { resource, handler });
        self.notify_if_ready(methods::RESOURCES_LIST_CHANGED);
    }

    pub fn add_resource_template(&self, template: ResourceTemplate, handler: Arc<dyn ResourceHandler>) {
        let pattern = template.uri_template.clone();
        self.inner.templates.insert(pattern, TemplateEntry { template, handler });
        self.notify_if_ready(methods::RESOURCES_LIST_CHANGED);
    }

    pub fn add_prompt(&self, prompt: Prompt, handler: Arc<dyn PromptHandler>) {
        let name = prompt.name.clone();
        self.inner.prompts.insert(name, PromptEntry { prompt, handler });
        self.notify_if_ready(methods::PROMPTS_LIST_CHANGED);
    }

    pub fn set_completion_handler(&self, handler: Arc<dyn CompletionHandler>) {
        *self.inner.completion_handler.write().unwrap() = Some(handler);
    }

    fn notify_if_ready(&self, method: &str) {
        if self.inner.session.state() == mcp_session::SessionState::Ready {
            let _ = self.inner.session.send_notification(method, None);
        }
    }

    /// Notify the client a subscribed resource changed, if it is currently
    /// subscribed (spec.md §6: `notifications/resources/updated`).
    pub fn notify_resource_updated(&self, uri: &str) {
        if self.inner.subscriptions.read().unwrap().contains(uri) {
            let _ = self
                .inner
                .session
                .send_notification(methods::RESOURCES_UPDATED, Some(json!({ "uri": uri })));
        }
    }

    /// The capabilities this server currently advertises, derived from
    /// which registries are non-empty (spec.md §3: "Adding the first entry
    /// of a kind implicitly enables the corresponding server capability").
    #[must_use]
    pub fn capabilities(&self) -> ServerCapabilities {
        let mut caps = ServerCapabilities::default().with_logging();
        if !self.inner.tools.is_empty() {
            caps = caps.with_tools(true);
        }
        if !self.inner.resources.is_empty() || !self.inner.templates.is_empty() {
            caps = caps.with_resources(true, true);
        }
        if !self.inner.prompts.is_empty() {
            caps = caps.with_prompts(true);
        }
        if self.inner.completion_handler.read().unwrap().is_some() {
            caps.completions = Some(Value::Object(serde_json::Map::new()));
        }
        caps.tasks = Some(Value::Object(serde_json::Map::new()));
        caps
    }

    /// The client capabilities learned during `initialize`, or the default
    /// (nothing supported) before that handshake completes.
    #[must_use]
    pub fn remote_capabilities(&self) -> ClientCapabilities {
        self.inner.remote_client_capabilities.read().unwrap().clone()
    }

    /// Register every MCP server-side handler on the session and start it
    /// against `transport` (spec.md §4.4, §4.6). Registration happens here
    /// rather than in `new()` so repeated calls to `add_tool`/etc. before
    /// `start()` are reflected in the handlers' captured `Server` clone —
    /// they share the same `Arc<ServerInner>` regardless.
    ///
    /// # Errors
    /// Whatever [`Session::start`] returns.
    pub async fn start<T>(&self, transport: T) -> McpResult<()>
    where
        T: Transport + 'static,
    {
        self.register_handlers();
        self.inner.session.start(transport).await
    }

    /// # Errors
    /// Whatever [`Session::stop`] returns.
    pub async fn stop(&self) -> McpResult<()> {
        self.inner.session.stop().await
    }

    fn register_handlers(&self) {
        let session = self.inner.session.clone();

        let this = self.clone();
        session.register_request_handler(
            methods::INITIALIZE,
            request_handler(move |params, ctx| {
                let this = this.clone();
                async move { this.handle_initialize(params, ctx).await }
            }),
        );

        session.register_request_handler(methods::PING, request_handler(|_params, _ctx| async { Ok(json!({})) }));

        let this = self.clone();
        session.register_request_handler(
            methods::LIST_TOOLS,
            request_handler(move |_params, _ctx| {
                let this = this.clone();
                async move { Ok(this.handle_list_tools()) }
            }),
        );

        let this = self.clone();
        session.register_request_handler(
            methods::CALL_TOOL,
            request_handler(move |params, ctx| {
                let this = this.clone();
                async move { this.handle_call_tool(params, ctx).await }
            }),
        );

        let this = self.clone();
        session.register_request_handler(
            methods::LIST_RESOURCES,
            request_handler(move |_params, _ctx| {
                let this = this.clone();
                async move { Ok(this.handle_list_resources()) }
            }),
        );

        let this = self.clone();
        session.register_request_handler(
            methods::LIST_RESOURCE_TEMPLATES,
            request_handler(move |_params, _ctx| {
                let this = this.clone();
                async move { Ok(this.handle_list_resource_templates()) }
            }),
        );

        let this = self.clone();
        session.register_request_handler(
            methods::READ_RESOURCE,
            request_handler(move |params, ctx| {
                let this = this.clone();
                async move { this.handle_read_resource(params, ctx).await }
            }),
        );

        let this = self.clone();
        session.register_request_handler(
            methods::SUBSCRIBE_RESOURCE,
            request_handler(move |params, _ctx| {
                let this = this.clone();
                async move { this.handle_subscribe(params, true) }
            }),
        );

        let this = self.clone();
        session.register_request_handler(
            methods::UNSUBSCRIBE_RESOURCE,
            request_handler(move |params, _ctx| {
                let this = this.clone();
                async move { this.handle_subscribe(params, false) }
            }),
        );

        let this = self.clone();
        session.register_request_handler(
            methods::LIST_PROMPTS,
            request_handler(move |_params, _ctx| {
                let this = this.clone();
                async move { Ok(this.handle_list_prompts()) }
            }),
        );

        let this = self.clone();
        session.register_request_handler(
            methods::GET_PROMPT,
            request_handler(move |params, ctx| {
                let this = this.clone();
                async move { this.handle_get_prompt(params, ctx).await }
            }),
        );

        let this = self.clone();
        session.register_request_handler(
            methods::COMPLETE,
            request_handler(move |params, ctx| {
                let this = this.clone();
                async move { this.handle_complete(params, ctx).await }
            }),
        );

        session.register_request_handler(
            methods::SET_LOG_LEVEL,
            request_handler(|_params, _ctx| async { Ok(json!({})) }),
        );

        let this = self.clone();
        session.register_request_handler(
            methods::GET_TASK,
            request_handler(move |params, _ctx| {
                let this = this.clone();
                async move { this.handle_task_get(params) }
            }),
        );

        let this = self.clone();
        session.register_request_handler(
            methods::TASK_RESULT,
            request_handler(move |params, _ctx| {
                let this = this.clone();
                async move { this.handle_task_result(params) }
            }),
        );

        let this = self.clone();
        session.register_request_handler(
            methods::CANCEL_TASK,
            request_handler(move |params, _ctx| {
                let this = this.clone();
                async move { this.handle_task_cancel(params) }
            }),
        );

        let this = self.clone();
        session.register_request_handler(
            methods::LIST_TASKS,
            request_handler(move |_params, _ctx| {
                let this = this.clone();
                async move { Ok(json!({ "tasks": this.inner.tasks.list() })) }
            }),
        );
    }

    async fn handle_initialize(&self, params: Option<Value>, _ctx: HandlerContext) -> McpResult<Value> {
        let params: InitializeParams =
            serde_json::from_value(params.unwrap_or(Value::Null)).map_err(McpError::from)?;

        *self.inner.remote_client_capabilities.write().unwrap() = params.capabilities;
        *self.inner.remote_client_info.write().unwrap() = Some(params.client_info);

        let negotiated = if SUPPORTED_VERSIONS.contains(&params.protocol_version.as_str()) {
            params.protocol_version
        } else {
            debug!(requested = %params.protocol_version, "client requested unsupported protocol version, offering ours");
            PROTOCOL_VERSION.to_string()
        };

        let result = InitializeResult {
            protocol_version: negotiated,
            server_info: self.inner.info.clone(),
            capabilities: self.capabilities(),
            instructions: self.inner.instructions.clone(),
        };
        serde_json::to_value(result).map_err(McpError::from)
    }

    fn handle_list_tools(&self) -> Value {
        let entries = self.inner.tools.list();
        let tools: Vec<Tool> = entries.iter().map(|e| e.tool.clone()).collect();
        json!({ "tools": tools })
    }

    async fn handle_call_tool(&self, params: Option<Value>, ctx: HandlerContext) -> McpResult<Value> {
        let params = params.ok_or_else(|| McpError::invalid_params("tools/call requires params"))?;
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| McpError::invalid_params("tools/call requires a \"name\" string"))?;
        let entry = self.inner.tools.get(name).ok_or_else(|| McpError::tool_not_found(name))?;
        let arguments = params.get("arguments").cloned();
        let result = entry.handler.call(arguments, ctx).await?;
        serde_json::to_value(result).map_err(McpError::from)
    }

    fn handle_list_resources(&self) -> Value {
        let entries = self.inner.resources.list();
        let resources: Vec<Resource> = entries.iter().map(|e| e.resource.clone()).collect();
        json!({ "resources": resources })
    }

    fn handle_list_resource_templates(&self) -> Value {
        let entries = self.inner.templates.list();
        let templates: Vec<ResourceTemplate> = entries.iter().map(|e| e.template.clone()).collect();
        json!({ "resourceTemplates": templates })
    }

    async fn handle_read_resource(&self, params: Option<Value>, ctx: HandlerContext) -> McpResult<Value> {
        let uri = params
            .as_ref()
            .and_then(|p| p.get("uri"))
            .and_then(Value::as_str)
            .ok_or_else(|| McpError::invalid_params("resources/read requires a \"uri\" string"))?;

        if let Some(entry) = self.inner.resources.get(uri) {
            let contents = entry.handler.read(uri, ctx).await?;
            return Ok(json!({ "contents": contents }));
        }

        for entry in self.inner.templates.list() {
            if uri_matches_template(uri, &entry.template.uri_template) {
                let contents: Vec<ResourceContents> = entry.handler.read(uri, ctx.clone()).await?;
                return Ok(json!({ "contents": contents }));
            }
        }

        Err(McpError::resource_not_found(uri))
    }

    fn handle_subscribe(&self, params: Option<Value>, subscribe: bool) -> McpResult<Value> {
        let uri = params
            .as_ref()
            .and_then(|p| p.get("uri"))
            .and_then(Value::as_str)
            .ok_or_else(|| McpError::invalid_params("requires a \"uri\" string"))?;
        let mut subs = self.inner.subscriptions.write().unwrap();
        if subscribe {
            subs.insert(uri.to_string());
        } else {
            subs.remove(uri);
        }
        Ok(json!({}))
    }

    fn handle_list_prompts(&self) -> Value {
        let entries = self.inner.prompts.list();
        let prompts: Vec<Prompt> = entries.iter().map(|e| e.prompt.clone()).collect();
        json!({ "prompts": prompts })
    }

    async fn handle_get_prompt(&self, params: Option<Value>, ctx: HandlerContext) -> McpResult<Value> {
        let params = params.ok_or_else(|| McpError::invalid_params("prompts/get requires params"))?;
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| McpError::invalid_params("prompts/get requires a \"name\" string"))?;
        let entry = self.inner.prompts.get(name).ok_or_else(|| McpError::prompt_not_found(name))?;
        let arguments = params.get("arguments").cloned();
        let result = entry.handler.get(arguments, ctx).await?;
        serde_json::to_value(result).map_err(McpError::from)
    }

    async fn handle_complete(&self, params: Option<Value>, ctx: HandlerContext) -> McpResult<Value> {
        let handler = self
            .inner
            .completion_handler
            .read()
            .unwrap()
            .clone()
            .ok_or_else(|| McpError::method_not_found(methods::COMPLETE))?;
        let params = params.ok_or_else(|| McpError::invalid_params("completion/complete requires params"))?;
        let result = handler.complete(params, ctx).await?;
        serde_json::to_value(result).map_err(McpError::from)
    }

    fn handle_task_get(&self, params: Option<Value>) -> McpResult<Value> {
        let task_id = task_id_param(&params)?;
        let task = self.inner.tasks.get(task_id)?;
        serde_json::to_value(task).map_err(McpError::from)
    }

    fn handle_task_result(&self, params: Option<Value>) -> McpResult<Value> {
        let task_id = task_id_param(&params)?;
        let result = self.inner.tasks.result(task_id)?;
        Ok(json!({ "result": result }))
    }

    fn handle_task_cancel(&self, params: Option<Value>) -> McpResult<Value> {
        let task_id = task_id_param(&params)?;
        let task = self.inner.tasks.cancel(task_id)?;
        serde_json::to_value(task).map_err(McpError::from)
    }
}

fn task_id_param(params: &Option<Value>) -> McpResult<&str> {
    params
        .as_ref()
        .and_then(|p| p.get("taskId"))
        .and_then(Value::as_str)
        .ok_or_else(|| McpError::invalid_params("requires a \"taskId\" string"))
}

/// RFC 6570-lite single-variable template match (`{name}` segments),
/// sufficient for the templates this workspace's entity model carries
/// (spec.md GLOSSARY: "Resource Template: URI pattern (RFC 6570)");
/// full RFC 6570 expression syntax is out of scope — only the
/// simple-variable subset servers in this corpus actually register.
fn uri_matches_template(uri: &str, template: &str) -> bool {
    let template_segments: Vec<&str> = template.split('/').collect();
    let uri_segments: Vec<&str> = uri.split('/').collect();
    if template_segments.len() != uri_segments.len() {
        return false;
    }
    template_segments
        .iter()
        .zip(uri_segments.iter())
        .all(|(t, u)| (t.starts_with('{') && t.ends_with('}')) || t == u)
}

