//! The client-role dispatcher (spec.md §4.6, C6): drives the `initialize`
//! handshake, exposes a typed call surface for the MCP server method set,
//! and registers handlers for the server-to-client role reversal
//! (`sampling/createMessage`, `roots/list`, `elicitation/create`). Built on
//! `mcp-session`'s engine, mirroring how `mcp-server` layers the server
//! role over the same engine.

mod client;
mod handlers;

pub use client::{Client, ClientBuilder};
pub use handlers::{ElicitationHandler, RootsProvider, SamplingHandler};
