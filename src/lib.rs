//! # Hospital Bridge — read-only MCP data access
//!
//! A small bridge that lets an AI assistant retrieve hospital operational
//! data without touching raw protected tables:
//! - Fixed catalog of five named, parameterized, read-only tools
//! - Argument validation before any query is instantiated; all values bind
//!   as parameters, never as query text
//! - A thin PostgreSQL adapter over a small bounded pool, relying on
//!   engine-enforced statement and idle timeouts
//! - Stdio JSON-RPC endpoint (`tools/list`, `tools/call`)
//!
//! ## Architecture
//!
//! ```text
//!   caller ──stdio──▶ RpcServer ──▶ Dispatcher ──▶ ToolCatalog (validate)
//!                                       │
//!                                       ▼
//!                                  PgAdapter ──▶ restricted views
//! ```
//!
//! The catalog is immutable after startup; the connection pool is the only
//! shared mutable state, so concurrent tool calls are independent reads.

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

// Re-export public API
pub mod db;
pub mod rpc;
pub mod tools;
pub mod types;

// Internal utilities
pub mod observability;

pub use types::{Config, Error, Result};
