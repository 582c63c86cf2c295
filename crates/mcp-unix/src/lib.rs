//! A concrete Unix domain socket transport plus a connection-limited,
//! gracefully-shutdownable multi-session listener (spec.md §1 "concrete
//! transports ... are out of scope for the session engine crate itself",
//! C2/C7 supplement) — the one real transport this workspace ships,
//! grounded on `turbomcp-transport/src/unix.rs` and
//! `turbomcp-server/src/v3/transport/unix.rs`.

mod listener;
mod transport;

pub use listener::{run, run_with_config, run_with_shutdown, UnixListenerConfig};
pub use transport::UnixSocketTransport;
