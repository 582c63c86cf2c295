//! The session engine itself (spec.md §4.5, C5): state machine, pending
//! request table, inbound dispatch loop, and cancellation, tied together
//! into one handle that role dispatchers (`mcp-server`/`mcp-client`) drive.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use mcp_core::{methods, ErrorKind, McpError, McpResult, RequestId};
use mcp_protocol::jsonrpc::{ErrorObject, Notification, Request};
use mcp_protocol::Message;
use mcp_transport::{Transport, TransportEvent, TransportState};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::handlers::{HandlerContext, NotificationHandler, RequestHandler};
use crate::pending::{CancelOnDrop, PendingTable};
use crate::state::SessionState;

/// Before giving up on a run of transient transport receive errors and
/// declaring the transport lost (spec.md §B supplement grounded on
/// `turbomcp-client/src/client/dispatcher.rs::spawn_routing_task`).
const MAX_CONSECUTIVE_TRANSPORT_ERRORS: u32 = 20;

enum ExitReason {
    Shutdown,
    TransportLost,
}

struct SessionInner {
    state_tx: watch::Sender<SessionState>,
    state_rx: watch::Receiver<SessionState>,
    pending: Arc<PendingTable>,
    request_handlers: StdMutex<HashMap<String, RequestHandler>>,
    notification_handlers: StdMutex<HashMap<String, NotificationHandler>>,
    /// Inbound requests currently being handled, keyed by canonical id, so
    /// an inbound `notifications/cancelled` can reach the right handler's
    /// context (spec.md §4.5.6, path 2).
    inbound_cancellations: StdMutex<HashMap<String, CancellationToken>>,
    next_id: AtomicU64,
    outbound_tx: mpsc::UnboundedSender<Message>,
    outbound_rx: StdMutex<Option<mpsc::UnboundedReceiver<Message>>>,
    shutdown: CancellationToken,
    started: AtomicBool,
    loop_handle: StdMutex<Option<JoinHandle<()>>>,
}

/// The session engine. Cheap to clone — every clone shares the same
/// underlying state, pending table and handler registries.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        let (state_tx, state_rx) = watch::channel(SessionState::Disconnected);
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(SessionInner {
                state_tx,
                state_rx,
                pending: Arc::new(PendingTable::default()),
                request_handlers: StdMutex::new(HashMap::new()),
                notification_handlers: StdMutex::new(HashMap::new()),
                inbound_cancellations: StdMutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                outbound_tx,
                outbound_rx: StdMutex::new(Some(outbound_rx)),
                shutdown: CancellationToken::new(),
                started: AtomicBool::new(false),
                loop_handle: StdMutex::new(None),
            }),
        }
    }

    /// Current state, without blocking.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.inner.state_rx.borrow()
    }

    /// Observe state transitions as they happen — this workspace's
    /// re-expression of the teacher's signal-based state notifications as
    /// a broadcast channel (spec.md §9).
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.inner.state_rx.clone()
    }

    fn set_state(&self, new: SessionState) {
        let old = *self.inner.state_rx.borrow();
        if old == new {
            return;
        }
        debug!(?old, ?new, "session state transition");
        let _ = self.inner.state_tx.send(new);
    }

    /// Register a handler for inbound requests with the given method
    /// (spec.md §4.5.1). Safe to call before or after [`Session::start`];
    /// the dispatch loop reads this table live.
    pub fn register_request_handler(&self, method: impl Into<String>, handler: RequestHandler) {
        self.inner
            .request_handlers
            .lock()
            .unwrap()
            .insert(method.into(), handler);
    }

    /// Register a handler for inbound notifications with the given method.
    pub fn register_notification_handler(&self, method: impl Into<String>, handler: NotificationHandler) {
        self.inner
            .notification_handlers
            .lock()
            .unwrap()
            .insert(method.into(), handler);
    }

    fn next_request_id(&self) -> RequestId {
        RequestId::from(self.inner.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Start the session against `transport`: spawns the inbound dispatch
    /// loop and drives `Disconnected → Connecting → Initializing`
    /// (spec.md §4.5.5). Per invariant S2, a session may be started only
    /// once — reuse after closing requires a fresh `Session`.
    ///
    /// # Errors
    /// `AlreadyInitialized` if called twice on the same session; whatever
    /// the transport's `connect()` returns otherwise.
    pub async fn start<T>(&self, mut transport: T) -> McpResult<()>
    where
        T: Transport + 'static,
    {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return Err(McpError::new(
                ErrorKind::AlreadyInitialized,
                "session has already been started",
            ));
        }

        self.set_state(SessionState::Connecting);
        transport.connect().await?;

        let outbound_rx = self
            .inner
            .outbound_rx
            .lock()
            .unwrap()
            .take()
            .expect("start() runs exactly once, guarded by `started`");

        let session = self.clone();
        let handle = tokio::spawn(async move {
            session.run_loop(transport, outbound_rx).await;
        });
        *self.inner.loop_handle.lock().unwrap() = Some(handle);

        self.set_state(SessionState::Initializing);
        Ok(())
    }

    /// Stop the session: signals the dispatch loop to exit, waits for it,
    /// and by then every pending request has been failed with
    /// `ConnectionClosed` (spec.md §4.5.3 P3).
    pub async fn stop(&self) -> McpResult<()> {
        self.inner.shutdown.cancel();
        let handle = self.inner.loop_handle.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        Ok(())
    }

    /// Send a request and await its response (spec.md §4.5.1). Dropping
    /// the returned future before it resolves cancels the request and
    /// notifies the peer (spec.md §4.5.6, path 1).
    ///
    /// # Errors
    /// `NotInitialized` outside `Ready` (or outside `Initializing` for the
    /// `initialize` method itself); otherwise whatever error the peer
    /// returned, or `ConnectionClosed` if the session closed first.
    pub async fn send_request(&self, method: impl Into<String>, params: Option<Value>) -> McpResult<Value> {
        let method = method.into();
        let state = self.state();
        let is_initialize = method == methods::INITIALIZE;
        if !(state.accepts_requests() || (is_initialize && state.accepts_initialize())) {
            return Err(McpError::not_initialized());
        }

        let id = self.next_request_id();
        let canonical = id.canonical();
        let (tx, rx) = oneshot::channel();
        self.inner.pending.insert(canonical.clone(), tx);

        let mut guard = CancelOnDrop::new(canonical.clone(), self.inner.pending.clone(), self.inner.outbound_tx.clone());

        let message = Message::request(id, method, params);
        if self.inner.outbound_tx.send(message).is_err() {
            guard.mark_completed();
            self.inner.pending.remove(&canonical);
            return Err(McpError::connection_closed());
        }

        let result = rx.await;
        guard.mark_completed();
        result.unwrap_or_else(|_| Err(McpError::connection_closed()))
    }

    /// Fire-and-forget; never waits on a response (spec.md §4.5.1).
    ///
    /// # Errors
    /// `TransportError` if the session loop is not running to receive it.
    pub fn send_notification(&self, method: impl Into<String>, params: Option<Value>) -> McpResult<()> {
        let message = Message::notification(method, params);
        self.inner
            .outbound_tx
            .send(message)
            .map_err(|_| McpError::new(ErrorKind::TransportError, "session loop is not running"))
    }

    /// Called by the client-role dispatcher once it has received the
    /// `initialize` response: sends `notifications/initialized` and
    /// transitions the session to `Ready` (spec.md §4.4 step 3). The
    /// server-role side never calls this directly — its session reaches
    /// `Ready` automatically when the inbound `notifications/initialized`
    /// arrives (see [`Session::dispatch_notification`]).
    ///
    /// # Errors
    /// `InvalidRequest` if the session is not currently `Initializing`.
    pub fn complete_initialization(&self) -> McpResult<()> {
        if self.state() != SessionState::Initializing {
            return Err(McpError::invalid_request(
                "complete_initialization called outside the Initializing state",
            ));
        }
        self.send_notification(methods::INITIALIZED, None)?;
        self.set_state(SessionState::Ready);
        Ok(())
    }

    async fn run_loop<T>(self, mut transport: T, mut outbound_rx: mpsc::UnboundedReceiver<Message>)
    where
        T: Transport + 'static,
    {
        let mut consecutive_errors: u32 = 0;
        let shutdown = self.inner.shutdown.clone();

        let exit_reason = loop {
            tokio::select! {
                () = shutdown.cancelled() => break ExitReason::Shutdown,
                outbound = outbound_rx.recv() => {
                    match outbound {
                        Some(message) => {
                            if let Err(err) = transport.send(message).await {
                                warn!(%err, "failed to hand outbound message to transport");
                            }
                        }
                        None => break ExitReason::Shutdown,
                    }
                }
                event = transport.recv() => {
                    match event {
                        Some(TransportEvent::MessageReceived(message)) => {
                            consecutive_errors = 0;
                            self.dispatch_inbound(message);
                        }
                        Some(TransportEvent::StateChanged { old, new }) => {
                            debug!(?old, ?new, "transport state changed");
                            if new.is_terminal() && self.state() != SessionState::Closing {
                                break ExitReason::TransportLost;
                            }
                        }
                        Some(TransportEvent::Error(err)) => {
                            consecutive_errors += 1;
                            warn!(%err, consecutive_errors, "transport receive error");
                            if consecutive_errors >= MAX_CONSECUTIVE_TRANSPORT_ERRORS {
                                break ExitReason::TransportLost;
                            }
                            let backoff_ms = 50u64.saturating_mul(1u64 << consecutive_errors.min(8));
                            tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                        }
                        None => break ExitReason::TransportLost,
                    }
                }
            }
        };

        match exit_reason {
            ExitReason::Shutdown => self.set_state(SessionState::Closing),
            ExitReason::TransportLost => {
                self.set_state(SessionState::Error);
                self.set_state(SessionState::Closing);
            }
        }
        let _ = transport.disconnect().await;
        self.inner.pending.fail_all(&McpError::connection_closed());
        self.set_state(SessionState::Disconnected);
    }

    fn dispatch_inbound(&self, message: Message) {
        match message {
            Message::Request(req) => self.dispatch_request(req),
            Message::Notification(note) => self.dispatch_notification(note),
            Message::Response(resp) => self.route_response(&resp.id, Ok(resp.result)),
            Message::ErrorResponse(err) => {
                let mut mcp_err = McpError::from_json_rpc(err.error.code, err.error.message);
                if let Some(data) = err.error.data {
                    mcp_err = mcp_err.with_data(data);
                }
                match err.id {
                    Some(id) => self.route_response(&id, Err(mcp_err)),
                    None => warn!("received an ErrorResponse with a null id; nothing to route it to"),
                }
            }
        }
    }

    fn route_response(&self, id: &RequestId, result: Result<Value, McpError>) {
        let canonical = id.canonical();
        if !self.inner.pending.complete(&canonical, result) {
            warn!(id = %canonical, "received a response for an unknown or already-completed request id");
        }
    }

    fn dispatch_request(&self, req: Request) {
        let handler = self.inner.request_handlers.lock().unwrap().get(&req.method).cloned();
        let Some(handler) = handler else {
            let error = ErrorObject {
                code: ErrorKind::MethodNotFound.to_json_rpc_code(),
                message: format!("method not found: {}", req.method),
                data: None,
            };
            let _ = self.inner.outbound_tx.send(Message::error_response(req.id, error));
            return;
        };

        let canonical_id = req.id.canonical();
        let ctx = HandlerContext::new();
        self.inner
            .inbound_cancellations
            .lock()
            .unwrap()
            .insert(canonical_id.clone(), ctx.cancellation.clone());

        let session = self.clone();
        let id = req.id;
        tokio::spawn(async move {
            let outcome = handler(req.params, ctx).await;
            session.inner.inbound_cancellations.lock().unwrap().remove(&canonical_id);
            let message = match outcome {
                Ok(result) => Message::response(id, result),
                Err(err) => Message::error_response(id, err),
            };
            let _ = session.inner.outbound_tx.send(message);
        });
    }

    fn dispatch_notification(&self, note: Notification) {
        if note.method == methods::INITIALIZED {
            if self.state() == SessionState::Initializing {
                self.set_state(SessionState::Ready);
            }
            return;
        }

        if note.method == methods::CANCELLED {
            if let Some(id) = note.params.as_ref().and_then(value_to_canonical_id) {
                if let Some(token) = self.inner.inbound_cancellations.lock().unwrap().get(&id) {
                    token.cancel();
                }
            }
            return;
        }

        let handler = self
            .inner
            .notification_handlers
            .lock()
            .unwrap()
            .get(&note.method)
            .cloned();
        let Some(handler) = handler else {
            return; // discard silently — spec.md §4.5.4 point 2.
        };
        let ctx = HandlerContext::new();
        tokio::spawn(async move {
            handler(note.params, ctx).await;
        });
    }
}

fn value_to_canonical_id(params: &Value) -> Option<String> {
    let id = params.get("requestId")?;
    match id {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
