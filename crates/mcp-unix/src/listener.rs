//! A connection-limited Unix domain socket listener (spec.md C7
//! supplement; grounded on
//! `turbomcp-server/src/v3/transport/unix.rs::run_with_shutdown` for the
//! accept loop/graceful shutdown shape, and
//! `turbomcp-server/src/v3/config.rs::ConnectionCounter` for the
//! acquire-on-accept/release-on-drop connection limiting).
//!
//! Each accepted connection gets its own freshly built [`Server`] (and
//! therefore its own `Session`, per spec.md S2: a session starts exactly
//! once) via a caller-supplied factory — the factory is expected to
//! register the same tools/resources/prompts on every call, typically by
//! cloning shared `Arc<dyn ToolHandler>` etc. into a new `Server::new(..)`.
//!
//! Invariant L1 ("stopping the listener closes every active session before
//! releasing the listen socket and removes the filesystem entry") means the
//! shutdown path can't just stop accepting: every in-flight session's
//! `Server` and `JoinHandle` are tracked in `sessions` below, and on
//! shutdown each tracked session is stopped and its task joined before the
//! socket file is removed.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use mcp_core::{McpError, McpResult};
use mcp_protocol::Message;
use mcp_server::Server;
use tokio::io::AsyncWriteExt;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::transport::UnixSocketTransport;

/// Live sessions this listener has accepted, keyed by a per-connection id,
/// so the shutdown path can stop and join every one of them (invariant L1).
type SessionRegistry = Arc<Mutex<HashMap<u64, (Server, JoinHandle<()>)>>>;

/// Caps how many sessions may be connected to one listener at once.
#[derive(Debug, Clone, Copy)]
pub struct UnixListenerConfig {
    pub max_connections: usize,
}

impl Default for UnixListenerConfig {
    fn default() -> Self {
        Self { max_connections: 256 }
    }
}

struct ConnectionCounter {
    current: AtomicUsize,
    max: usize,
}

impl ConnectionCounter {
    fn new(max: usize) -> Self {
        Self {
            current: AtomicUsize::new(0),
            max,
        }
    }

    fn try_acquire(self: &Arc<Self>) -> Option<ConnectionGuard> {
        loop {
            let current = self.current.load(Ordering::Relaxed);
            if current >= self.max {
                return None;
            }
            if self
                .current
                .compare_exchange(current, current + 1, Ordering::SeqCst, Ordering::Relaxed)
                .is_ok()
            {
                return Some(ConnectionGuard { counter: Arc::clone(self) });
            }
        }
    }

    fn current(&self) -> usize {
        self.current.load(Ordering::Relaxed)
    }
}

/// Releases its connection slot when dropped, regardless of how the
/// handling task exits (spec.md C7 supplement, invariant L1/L2: the
/// session count tracked by the listener always matches live connections).
struct ConnectionGuard {
    counter: Arc<ConnectionCounter>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.counter.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Run `factory` against Unix socket `path` until ctrl-c (spec.md C7).
///
/// # Errors
/// Whatever binding the socket returns.
pub async fn run<F>(factory: F, path: impl AsRef<Path>) -> McpResult<()>
where
    F: Fn() -> Server + Send + Sync + 'static,
{
    run_with_config(factory, path, UnixListenerConfig::default()).await
}

/// Run `factory` with an explicit connection limit, until ctrl-c.
///
/// # Errors
/// Whatever binding the socket returns.
pub async fn run_with_config<F>(factory: F, path: impl AsRef<Path>, config: UnixListenerConfig) -> McpResult<()>
where
    F: Fn() -> Server + Send + Sync + 'static,
{
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received ctrl-c, shutting down unix socket listener");
            let _ = shutdown_tx.send(true);
        }
    });

    let result = run_with_shutdown(factory, path, config, shutdown_rx).await;
    signal_task.abort();
    result
}

/// Run `factory` against `path` until `shutdown` carries `true` (spec.md
/// C7). Stale socket files at `path` are removed before binding; the
/// socket file is removed again on the way out.
///
/// # Errors
/// Whatever removing a stale socket file or binding the listener returns.
pub async fn run_with_shutdown<F>(
    factory: F,
    path: impl AsRef<Path>,
    config: UnixListenerConfig,
    mut shutdown: watch::Receiver<bool>,
) -> McpResult<()>
where
    F: Fn() -> Server + Send + Sync + 'static,
{
    let path = path.as_ref().to_path_buf();
    if path.exists() {
        std::fs::remove_file(&path)
            .map_err(|e| McpError::internal(format!("failed to remove stale socket {path:?}: {e}")))?;
    }

    let listener =
        UnixListener::bind(&path).map_err(|e| McpError::internal(format!("failed to bind {path:?}: {e}")))?;
    let counter = Arc::new(ConnectionCounter::new(config.max_connections));
    let factory = Arc::new(factory);
    let sessions: SessionRegistry = Arc::new(Mutex::new(HashMap::new()));
    let next_id = AtomicU64::new(0);

    info!(?path, max_connections = config.max_connections, "unix socket listener started");

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("unix socket listener shutting down");
                    break;
                }
            }
            accepted = listener.accept() => {
                let (stream, _addr) = match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        error!(%e, "failed to accept unix socket connection");
                        continue;
                    }
                };

                let Some(guard) = counter.try_acquire() else {
                    warn!(current = counter.current(), max = config.max_connections, "rejecting connection: at capacity");
                    reject_connection(stream).await;
                    continue;
                };

                debug!(current = counter.current(), max = config.max_connections, "accepted unix socket connection");
                let server = factory();
                let id = next_id.fetch_add(1, Ordering::Relaxed);
                let sessions_for_task = Arc::clone(&sessions);
                let server_for_task = server.clone();
                let handle = tokio::spawn(async move {
                    let _guard = guard;
                    let transport = UnixSocketTransport::from_accepted(stream);
                    if let Err(e) = server_for_task.start(transport).await {
                        error!(%e, "unix socket session failed to start");
                    } else {
                        let mut state = server_for_task.session().watch_state();
                        while state.changed().await.is_ok() {
                            if *state.borrow() == mcp_session::SessionState::Disconnected {
                                break;
                            }
                        }
                    }
                    sessions_for_task.lock().unwrap().remove(&id);
                    debug!("unix socket session closed");
                });
                sessions.lock().unwrap().insert(id, (server, handle));
            }
        }
    }

    let live: Vec<(Server, JoinHandle<()>)> = sessions.lock().unwrap().drain().map(|(_, v)| v).collect();
    for (server, handle) in live {
        let _ = server.stop().await;
        let _ = handle.await;
    }

    if path.exists() {
        let _ = std::fs::remove_file(&path);
    }
    Ok(())
}

async fn reject_connection(mut stream: UnixStream) {
    let error = McpError::internal("server is at maximum connection capacity");
    let message = Message::parse_error_response(error);
    if let Ok(line) = message.encode() {
        let _ = stream.write_all(line.as_bytes()).await;
        let _ = stream.write_all(b"\n").await;
        let _ = stream.flush().await;
    }
}
