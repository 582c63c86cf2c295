//! The session engine (spec.md §4.5, C5) — the hardest component of the
//! workspace: owns a transport, frames dispatch through `mcp-protocol`'s
//! codec, correlates outbound requests with inbound responses, dispatches
//! inbound requests/notifications to registered handlers, and drives the
//! session state machine. `mcp-server`/`mcp-client` are thin role layers
//! built on top of [`Session`]; this crate knows nothing about MCP method
//! names beyond the handshake ones it must special-case.

mod handlers;
mod pending;
mod session;
mod state;

pub use handlers::{notification_handler, request_handler, HandlerContext, NotificationHandler, RequestHandler};
pub use session::Session;
pub use state::SessionState;
