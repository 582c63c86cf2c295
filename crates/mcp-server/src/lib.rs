//! The server-role dispatcher (spec.md §4.6, C6): entity registries, the
//! experimental task store, and the server-to-client call surface
//! (`sampling/createMessage`, `roots/list`, `elicitation/create`), built
//! on `mcp-session`'s engine. This crate knows the MCP server method set;
//! it does not know how to transport bytes (`mcp-transport`) or what a
//! tool's arguments mean (left to registered [`handlers::ToolHandler`]s).

mod handlers;
mod registry;
mod reversal;
mod server;
mod tasks;

pub use handlers::{CompletionHandler, PromptHandler, ResourceHandler, ToolHandler};
pub use reversal::{completion_values, create_message, elicit, list_roots, user_message};
pub use server::Server;
pub use tasks::TaskStore;
