//! The `Transport` contract (spec.md §4.2, C2).

use async_trait::async_trait;
use mcp_core::McpResult;
use mcp_protocol::Message;

use crate::types::{TransportEvent, TransportState};

/// A duplex carrier abstracted to the capability set the session engine
/// needs: connect, disconnect, send one message, and a serial stream of
/// inbound messages / state changes / errors.
///
/// Concrete transports (stdio, WebSocket, Streamable HTTP, Unix socket)
/// are out of scope for this crate (spec.md §1); only this contract and
/// [`crate::memory::duplex_pair`], the in-memory reference pair used for
/// tests, live here.
#[async_trait]
pub trait Transport: Send {
    /// Completes when the peer is reachable. Idempotent if already
    /// connected.
    async fn connect(&mut self) -> McpResult<()>;

    /// Completes when the carrier is closed. Idempotent.
    async fn disconnect(&mut self) -> McpResult<()>;

    /// Completes when `message` has been handed to the OS — not when it
    /// has been delivered end-to-end (spec.md §4.2).
    async fn send(&mut self, message: Message) -> McpResult<()>;

    /// Await the next out-event. Returns `None` once the transport will
    /// never produce another event (e.g. both ends of an in-memory pair
    /// have been disconnected).
    async fn recv(&mut self) -> Option<TransportEvent>;

    /// Current lifecycle state, without awaiting.
    fn state(&self) -> TransportState;
}
