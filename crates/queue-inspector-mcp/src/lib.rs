//! # Queue Inspector MCP
//!
//! Exposes the inspection client to AI agents as Model Context Protocol
//! tools:
//!
//! - `ListMessages` - summaries of live messages, optionally bounded by time
//! - `ListDeadLetters` - the same for the dead-letter queue
//! - `PrintMessage` - one full message by sequence number
//!
//! The tools are served over stdio or streamable HTTP ([`transport`]).
//! Argument parsing happens here; all queue logic lives in
//! `queue_inspector_core`.

pub mod server;
pub mod tools;
pub mod transport;

pub use server::{InspectorMcpServer, SERVER_NAME};
pub use tools::{ListParams, PrintMessageParams, ToolError};
pub use transport::{create_mcp_router, serve_http, MCP_PATH};
