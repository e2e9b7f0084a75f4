//! Data source access layer.

pub mod adapter;

pub use adapter::{BindValue, PgAdapter, QueryExecutor, RowMap};
