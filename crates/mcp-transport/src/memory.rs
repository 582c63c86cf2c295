//! An in-memory, linked duplex transport pair — the reference transport
//! spec.md §8 assumes for its end-to-end scenarios (E1–E6). Two instances
//! are created together; whatever one side sends, the other side's `recv`
//! surfaces as a `MessageReceived` event.

use std::collections::VecDeque;

use async_trait::async_trait;
use mcp_core::{McpError, McpResult};
use mcp_protocol::Message;
use tokio::sync::mpsc;

use crate::traits::Transport;
use crate::types::{TransportEvent, TransportState};

/// One end of an in-memory transport pair. Construct a linked pair with
/// [`duplex_pair`].
#[derive(Debug)]
pub struct InMemoryTransport {
    state: TransportState,
    peer_closed: bool,
    outbound: mpsc::UnboundedSender<Message>,
    inbound: mpsc::UnboundedReceiver<Message>,
    /// Locally-originated events (state changes) surfaced before draining
    /// `inbound`, so `connect()`'s transition is observable by `recv()`
    /// even though it never crosses the channel.
    pending: VecDeque<TransportEvent>,
}

/// Build two linked [`InMemoryTransport`]s; messages sent on one are
/// delivered as [`TransportEvent::MessageReceived`] on the other.
#[must_use]
pub fn duplex_pair() -> (InMemoryTransport, InMemoryTransport) {
    let (a_tx, b_rx) = mpsc::unbounded_channel();
    let (b_tx, a_rx) = mpsc::unbounded_channel();
    (
        InMemoryTransport {
            state: TransportState::Disconnected,
            peer_closed: false,
            outbound: a_tx,
            inbound: a_rx,
            pending: VecDeque::new(),
        },
        InMemoryTransport {
            state: TransportState::Disconnected,
            peer_closed: false,
            outbound: b_tx,
            inbound: b_rx,
            pending: VecDeque::new(),
        },
    )
}

impl InMemoryTransport {
    fn transition(&mut self, new: TransportState) {
        let old = std::mem::replace(&mut self.state, new.clone());
        if old != new {
            self.pending.push_back(TransportEvent::StateChanged { old, new });
        }
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn connect(&mut self) -> McpResult<()> {
        if self.state.is_connected() {
            return Ok(());
        }
        self.transition(TransportState::Connecting);
        self.transition(TransportState::Connected);
        Ok(())
    }

    async fn disconnect(&mut self) -> McpResult<()> {
        if matches!(self.state, TransportState::Disconnected) {
            return Ok(());
        }
        self.transition(TransportState::Disconnecting);
        self.transition(TransportState::Disconnected);
        Ok(())
    }

    async fn send(&mut self, message: Message) -> McpResult<()> {
        if !self.state.is_connected() {
            return Err(McpError::new(
                mcp_core::ErrorKind::TransportError,
                "cannot send: transport is not connected",
            ));
        }
        self.outbound.send(message).map_err(|_| {
            McpError::new(
                mcp_core::ErrorKind::TransportError,
                "cannot send: peer transport has been dropped",
            )
        })
    }

    async fn recv(&mut self) -> Option<TransportEvent> {
        if let Some(event) = self.pending.pop_front() {
            return Some(event);
        }
        if self.peer_closed {
            return None;
        }
        match self.inbound.recv().await {
            Some(message) => Some(TransportEvent::MessageReceived(message)),
            None => {
                self.peer_closed = true;
                self.transition(TransportState::Failed("peer transport dropped".to_string()));
                self.pending.pop_front()
            }
        }
    }

    fn state(&self) -> TransportState {
        self.state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcp_protocol::Message;

    #[tokio::test]
    async fn connect_emits_connecting_then_connected() {
        let (mut a, _b) = duplex_pair();
        a.connect().await.unwrap();
        let first = a.recv().await.unwrap();
        assert!(matches!(
            first,
            TransportEvent::StateChanged {
                new: TransportState::Connecting,
                ..
            }
        ));
        let second = a.recv().await.unwrap();
        assert!(matches!(
            second,
            TransportEvent::StateChanged {
                new: TransportState::Connected,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn message_sent_on_one_side_arrives_on_the_other() {
        let (mut a, mut b) = duplex_pair();
        a.connect().await.unwrap();
        b.connect().await.unwrap();
        // drain the connect-induced state events.
        a.recv().await;
        a.recv().await;
        b.recv().await;
        b.recv().await;

        let msg = Message::request(1i64, "ping", None);
        a.send(msg.clone()).await.unwrap();

        let event = b.recv().await.unwrap();
        match event {
            TransportEvent::MessageReceived(received) => assert_eq!(received, msg),
            other => panic!("expected MessageReceived, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn send_before_connect_fails() {
        let (mut a, _b) = duplex_pair();
        let err = a.send(Message::notification("ping", None)).await.unwrap_err();
        assert_eq!(err.kind, mcp_core::ErrorKind::TransportError);
    }
}
