//! Application error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation and provide
//! clear error messages with context. Data-source failures are classified into
//! the three kinds the caller is allowed to see; raw engine text never crosses
//! this boundary.

use thiserror::Error;

/// Application result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error enum for the hospital bridge.
#[derive(Error, Debug)]
pub enum Error {
    /// Requested tool is not in the catalog.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// A required argument was not supplied.
    #[error("missing argument: {0}")]
    MissingArgument(String),

    /// An argument failed its parameter spec (wrong type or unknown name).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The data source hit a statement or idle timeout.
    #[error("timeout: {0}")]
    Timeout(String),

    /// A connection could not be obtained or was lost mid-flight.
    #[error("connection error: {0}")]
    ConnectionError(String),

    /// The data source rejected the query (permission, constraint, decode).
    #[error("query error: {0}")]
    QueryError(String),

    /// JSON-RPC method outside the endpoint's surface. Protocol-level, kept
    /// apart from `UnknownTool` which is reserved for catalog misses.
    #[error("method not found: {0}")]
    MethodNotFound(String),

    /// Startup configuration problems (bad catalog entry, bad DB coordinates).
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable wire code reported to the caller alongside the message.
    pub fn wire_code(&self) -> &'static str {
        match self {
            Error::UnknownTool(_) => "UNKNOWN_TOOL",
            Error::MissingArgument(_) => "MISSING_ARGUMENT",
            Error::InvalidArgument(_) => "INVALID_ARGUMENT",
            Error::Timeout(_) => "TIMEOUT",
            Error::ConnectionError(_) => "CONNECTION_ERROR",
            Error::QueryError(_) => "QUERY_ERROR",
            Error::MethodNotFound(_) => "METHOD_NOT_FOUND",
            Error::Config(_) => "CONFIG_ERROR",
            Error::Serialization(_) => "SERIALIZATION_ERROR",
            Error::Io(_) => "IO_ERROR",
        }
    }

    /// True for failures caught before any query was issued.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::UnknownTool(_) | Error::MissingArgument(_) | Error::InvalidArgument(_)
        )
    }
}

// Convenience constructors
impl Error {
    pub fn unknown_tool(msg: impl Into<String>) -> Self {
        Self::UnknownTool(msg.into())
    }

    pub fn missing_argument(msg: impl Into<String>) -> Self {
        Self::MissingArgument(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryError(msg.into())
    }

    pub fn method_not_found(msg: impl Into<String>) -> Self {
        Self::MethodNotFound(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_codes_are_stable() {
        assert_eq!(Error::unknown_tool("x").wire_code(), "UNKNOWN_TOOL");
        assert_eq!(Error::missing_argument("x").wire_code(), "MISSING_ARGUMENT");
        assert_eq!(Error::invalid_argument("x").wire_code(), "INVALID_ARGUMENT");
        assert_eq!(Error::timeout("x").wire_code(), "TIMEOUT");
        assert_eq!(Error::connection("x").wire_code(), "CONNECTION_ERROR");
        assert_eq!(Error::query("x").wire_code(), "QUERY_ERROR");
        assert_eq!(Error::method_not_found("x").wire_code(), "METHOD_NOT_FOUND");
    }

    #[test]
    fn validation_errors_are_local() {
        assert!(Error::unknown_tool("t").is_validation());
        assert!(Error::missing_argument("a").is_validation());
        assert!(Error::invalid_argument("a").is_validation());
        assert!(!Error::timeout("t").is_validation());
        assert!(!Error::query("q").is_validation());
        assert!(!Error::method_not_found("m").is_validation());
    }
}
