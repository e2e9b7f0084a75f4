//! Stdio JSON-RPC (MCP) protocol endpoint.
//!
//! The transport is deliberately thin: it decodes newline-delimited JSON-RPC
//! frames, routes `initialize` / `ping` / `tools/list` / `tools/call`, and
//! marshals responses back. All tool semantics live behind the dispatcher.

pub mod codec;
pub mod router;
pub mod server;

pub use server::RpcServer;
