//! Core types for the hospital bridge.
//!
//! This module provides foundational types used throughout the system:
//! - **Errors**: Application error taxonomy with thiserror derives
//! - **Config**: Configuration structures for data source, pool, and endpoint

mod config;
mod errors;

pub use config::{Config, DbConfig, PoolConfig, RpcConfig};
pub use errors::{Error, Result};
