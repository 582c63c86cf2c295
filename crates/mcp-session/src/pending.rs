//! The pending-request table (spec.md §4.5.3) and caller-side cancellation
//! (spec.md §4.5.6, path 1).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use mcp_core::McpError;
use mcp_protocol::Message;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

type PendingSender = oneshot::Sender<Result<Value, McpError>>;

/// Mapping from canonical outbound request id to its completion sink.
///
/// Invariants (spec.md §4.5.3):
/// - **P1**: an entry exists from the instant the outbound bytes are
///   enqueued until exactly one of (response, error, session-closed,
///   caller-cancellation) completes it.
/// - **P2**: exactly one completion per entry — [`PendingTable::complete`]
///   removes the entry atomically, so a duplicate inbound response for the
///   same id finds nothing and the caller logs-and-discards.
/// - **P3**: [`PendingTable::fail_all`] completes every remaining entry
///   with `ConnectionClosed` before the table is dropped.
#[derive(Default)]
pub(crate) struct PendingTable {
    inner: Mutex<HashMap<String, PendingSender>>,
}

impl PendingTable {
    pub(crate) fn insert(&self, id: String, tx: PendingSender) {
        self.inner.lock().unwrap().insert(id, tx);
    }

    /// Complete and remove the entry for `id`. Returns `false` if no entry
    /// existed (duplicate or expired response — P2).
    pub(crate) fn complete(&self, id: &str, result: Result<Value, McpError>) -> bool {
        match self.inner.lock().unwrap().remove(id) {
            Some(tx) => {
                let _ = tx.send(result);
                true
            }
            None => false,
        }
    }

    /// Remove the entry for `id` without completing it — used by
    /// [`CancelOnDrop`], whose `oneshot::Sender` is simply dropped, which
    /// the awaiting receiver sees as a closed channel.
    pub(crate) fn remove(&self, id: &str) {
        self.inner.lock().unwrap().remove(id);
    }

    pub(crate) fn fail_all(&self, err: &McpError) {
        let mut map = self.inner.lock().unwrap();
        for (_, tx) in map.drain() {
            let _ = tx.send(Err(err.clone()));
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}

/// Dropped when `send_request`'s returned future is dropped before
/// completion (the caller cancelled it, e.g. via `tokio::time::timeout`).
/// On drop, if the request hadn't already completed, removes the pending
/// entry and emits `notifications/cancelled` so the peer can stop work
/// (spec.md §4.5.6, path 1).
pub(crate) struct CancelOnDrop {
    id: String,
    table: Arc<PendingTable>,
    outbound: mpsc::UnboundedSender<Message>,
    completed: bool,
}

impl CancelOnDrop {
    pub(crate) fn new(id: String, table: Arc<PendingTable>, outbound: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            id,
            table,
            outbound,
            completed: false,
        }
    }

    pub(crate) fn mark_completed(&mut self) {
        self.completed = true;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        self.table.remove(&self.id);
        let notification = Message::notification(
            mcp_core::methods::CANCELLED,
            Some(serde_json::json!({ "requestId": self.id })),
        );
        // The loop task may already be gone; there's nothing more to do
        // about a cancellation notification that can't be sent.
        let _ = self.outbound.send(notification);
    }
}
