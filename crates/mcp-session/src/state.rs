//! The session state machine (spec.md §4.5.5, invariants S1/S2).

/// ```text
/// Disconnected ── start() ──────► Connecting
/// Connecting   ── transport up ─► Initializing   (role runs initialize)
/// Initializing ── handshake ok ─► Ready
/// Ready        ── stop()/loss ──► Closing
/// Closing      ── clean ────────► Disconnected
/// (any)        ── fatal ────────► Error ──► Closing
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Initializing,
    Ready,
    Closing,
    Error,
}

impl SessionState {
    /// Whether `send_request` for an arbitrary method is accepted in this
    /// state (spec.md §4.5.5 invariant S1). The `initialize` method itself
    /// is special-cased by the caller, not here.
    #[must_use]
    pub fn accepts_requests(self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Whether this state permits an outbound `initialize` request.
    #[must_use]
    pub fn accepts_initialize(self) -> bool {
        matches!(self, Self::Initializing)
    }
}
