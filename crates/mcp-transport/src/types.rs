//! Transport state and event types (spec.md §4.2, C2).

use mcp_core::McpError;
use mcp_protocol::Message;

/// Lifecycle state of a [`crate::Transport`] (spec.md §4.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
    /// Terminal failure; carries a short human-readable reason.
    Failed(String),
}

impl TransportState {
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// An out-event a transport delivers to its owning session (spec.md §4.2).
/// Events from a given transport are delivered serially — never reordered
/// within one direction — which is what lets `mcp-session` treat `recv`
/// as a plain sequential stream.
#[derive(Debug)]
pub enum TransportEvent {
    MessageReceived(Message),
    StateChanged { old: TransportState, new: TransportState },
    Error(McpError),
}
