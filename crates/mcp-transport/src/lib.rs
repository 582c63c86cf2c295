//! The `Transport` contract the session engine depends on, plus an
//! in-memory reference transport used by tests (spec.md §4.2, C2).

pub mod memory;
pub mod traits;
pub mod types;

pub use memory::{duplex_pair, InMemoryTransport};
pub use traits::Transport;
pub use types::{TransportEvent, TransportState};
