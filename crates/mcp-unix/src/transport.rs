//! A concrete [`Transport`] over a single `UnixStream`, framed with
//! newline-delimited JSON (spec.md C2 supplement; grounded on
//! `turbomcp-transport/src/unix.rs`'s
//! `Framed<UnixStream, LinesCodec>` choice, narrowed to one connection per
//! transport instance to match this workspace's `Transport` contract).

use std::collections::VecDeque;
use std::path::PathBuf;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use mcp_core::{ErrorKind, McpError, McpResult};
use mcp_protocol::Message;
use tokio::net::UnixStream;
use tokio_util::codec::{Framed, LinesCodec};
use tracing::warn;

use mcp_transport::{Transport, TransportEvent, TransportState};

enum Socket {
    /// Not yet connected; `connect()` dials this path (client role).
    Pending(PathBuf),
    /// Already-accepted stream handed over by the listener (server role).
    Accepted(UnixStream),
    Framed(Framed<UnixStream, LinesCodec>),
    Closed,
}

/// One Unix domain socket connection, client- or server-accepted, wrapped
/// to the session engine's [`Transport`] contract.
pub struct UnixSocketTransport {
    socket: Socket,
    state: TransportState,
    pending: VecDeque<TransportEvent>,
}

impl UnixSocketTransport {
    /// Build a transport that dials `path` on `connect()` (client role).
    #[must_use]
    pub fn connect_to(path: impl Into<PathBuf>) -> Self {
        Self {
            socket: Socket::Pending(path.into()),
            state: TransportState::Disconnected,
            pending: VecDeque::new(),
        }
    }

    /// Wrap a stream a listener has already accepted (server role).
    #[must_use]
    pub fn from_accepted(stream: UnixStream) -> Self {
        Self {
            socket: Socket::Accepted(stream),
            state: TransportState::Disconnected,
            pending: VecDeque::new(),
        }
    }

    fn transition(&mut self, new: TransportState) {
        let old = std::mem::replace(&mut self.state, new.clone());
        if old != new {
            self.pending.push_back(TransportEvent::StateChanged { old, new });
        }
    }
}

#[async_trait]
impl Transport for UnixSocketTransport {
    async fn connect(&mut self) -> McpResult<()> {
        if self.state.is_connected() {
            return Ok(());
        }
        self.transition(TransportState::Connecting);

        let stream = match std::mem::replace(&mut self.socket, Socket::Closed) {
            Socket::Pending(path) => UnixStream::connect(&path).await.map_err(|e| {
                McpError::new(ErrorKind::TransportError, format!("failed to connect to {path:?}: {e}"))
            })?,
            Socket::Accepted(stream) => stream,
            Socket::Framed(framed) => {
                self.socket = Socket::Framed(framed);
                self.transition(TransportState::Connected);
                return Ok(());
            }
            Socket::Closed => {
                return Err(McpError::new(ErrorKind::TransportError, "transport already closed"));
            }
        };

        self.socket = Socket::Framed(Framed::new(stream, LinesCodec::new_with_max_length(mcp_core::MAX_MESSAGE_SIZE)));
        self.transition(TransportState::Connected);
        Ok(())
    }

    async fn disconnect(&mut self) -> McpResult<()> {
        if matches!(self.state, TransportState::Disconnected) {
            return Ok(());
        }
        self.transition(TransportState::Disconnecting);
        self.socket = Socket::Closed;
        self.transition(TransportState::Disconnected);
        Ok(())
    }

    async fn send(&mut self, message: Message) -> McpResult<()> {
        let Socket::Framed(framed) = &mut self.socket else {
            return Err(McpError::new(ErrorKind::TransportError, "cannot send: transport is not connected"));
        };
        let line = message.encode()?;
        framed
            .send(line)
            .await
            .map_err(|e| McpError::new(ErrorKind::TransportError, format!("failed to write to socket: {e}")))
    }

    async fn recv(&mut self) -> Option<TransportEvent> {
        if let Some(event) = self.pending.pop_front() {
            return Some(event);
        }

        let Socket::Framed(framed) = &mut self.socket else {
            return None;
        };

        match framed.next().await {
            Some(Ok(line)) => match Message::decode(&line) {
                Ok(message) => Some(TransportEvent::MessageReceived(message)),
                Err(err) => {
                    warn!(%err, "dropping unparseable line from unix socket");
                    Some(TransportEvent::Error(err))
                }
            },
            Some(Err(err)) => {
                let reason = format!("unix socket read error: {err}");
                self.socket = Socket::Closed;
                self.transition(TransportState::Failed(reason.clone()));
                self.pending
                    .push_back(TransportEvent::Error(McpError::new(ErrorKind::TransportError, reason)));
                self.pending.pop_front()
            }
            None => {
                self.socket = Socket::Closed;
                self.transition(TransportState::Failed("peer closed the unix socket".to_string()));
                self.pending.pop_front()
            }
        }
    }

    fn state(&self) -> TransportState {
        self.state.clone()
    }
}
