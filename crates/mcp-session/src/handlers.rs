//! Handler registration types (spec.md §4.5.1, §4.5.4).
//!
//! Handlers run as independently spawned tasks, not inline in the event
//! loop (spec.md §5): a handler awaiting I/O must not block the loop from
//! dispatching the next inbound message.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use mcp_core::McpError;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// The context passed to every invoked handler: its peer-supplied
/// parameters travel separately, but cancellation observation happens
/// through this token (spec.md §4.5.6, path 2 — "propagate cancellation
/// into that handler's invocation context"). Cooperative: the handler must
/// check `token.is_cancelled()` (or select on `token.cancelled()`) at its
/// own suspension points.
#[derive(Debug, Clone)]
pub struct HandlerContext {
    pub cancellation: CancellationToken,
}

impl HandlerContext {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            cancellation: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Handler for an inbound JSON-RPC request. Returns either the `result`
/// value (a successful Response) or an `McpError` (an ErrorResponse).
pub type RequestHandler =
    Arc<dyn Fn(Option<Value>, HandlerContext) -> BoxFuture<'static, Result<Value, McpError>> + Send + Sync>;

/// Handler for an inbound JSON-RPC notification. Infallible by contract
/// (spec.md §4.5.4: notification dispatch "MUST NOT error").
pub type NotificationHandler = Arc<dyn Fn(Option<Value>, HandlerContext) -> BoxFuture<'static, ()> + Send + Sync>;

/// Wrap a plain async closure as a [`RequestHandler`].
pub fn request_handler<F, Fut>(f: F) -> RequestHandler
where
    F: Fn(Option<Value>, HandlerContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, McpError>> + Send + 'static,
{
    Arc::new(move |params, ctx| Box::pin(f(params, ctx)))
}

/// Wrap a plain async closure as a [`NotificationHandler`].
pub fn notification_handler<F, Fut>(f: F) -> NotificationHandler
where
    F: Fn(Option<Value>, HandlerContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |params, ctx| Box::pin(f(params, ctx)))
}
