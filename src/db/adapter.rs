//! Data source adapter — thin, swappable transport to the restricted views.
//!
//! The adapter checks a connection out per execution and releases it on every
//! exit path (the pool guard drops on success, timeout, and error alike). It
//! decodes rows into the declared column types but does not reshape them;
//! shaping is the dispatcher's job.
//!
//! Failure classification is the one piece of judgment here: engine errors
//! collapse into `Timeout`, `ConnectionError`, or `QueryError`, and the raw
//! engine text is logged at debug instead of being surfaced to the caller.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row as _};

use crate::tools::catalog::{ColumnDef, ColumnType};
use crate::types::{DbConfig, Error, PoolConfig, Result};

/// One decoded result row: declared column name → JSON value.
pub type RowMap = serde_json::Map<String, Value>;

/// A validated argument value, bound as a query parameter. Never interpolated
/// into query text.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

/// Executes one parameterized read against the data source.
///
/// Implementations must be safe under concurrent invocation; the connection
/// pool is the only shared state.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(
        &self,
        template: &str,
        params: &[BindValue],
        columns: &[ColumnDef],
    ) -> Result<Vec<RowMap>>;
}

/// PostgreSQL adapter over a small bounded pool.
#[derive(Debug, Clone)]
pub struct PgAdapter {
    pool: PgPool,
}

impl PgAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Build the pool and probe connectivity. A failed probe is process-fatal
    /// at startup: a bridge that cannot reach its views should not accept
    /// requests.
    pub async fn connect(db: &DbConfig, pool_cfg: &PoolConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(pool_cfg.max_connections)
            .acquire_timeout(pool_cfg.acquire_timeout)
            .connect(&db.connect_url())
            .await
            .map_err(classify)?;

        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .map_err(classify)?;

        tracing::info!(
            host = %db.host,
            database = %db.database,
            max_connections = pool_cfg.max_connections,
            "data source pool ready"
        );
        Ok(Self::new(pool))
    }

    /// Close the pool on shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl QueryExecutor for PgAdapter {
    async fn execute(
        &self,
        template: &str,
        params: &[BindValue],
        columns: &[ColumnDef],
    ) -> Result<Vec<RowMap>> {
        // Checkout is bounded by acquire_timeout; the guard releases the
        // connection when it drops, on every return path below.
        let mut conn = self.pool.acquire().await.map_err(classify)?;

        let mut query = sqlx::query(template);
        for param in params {
            query = match param {
                BindValue::Int(v) => query.bind(*v),
                BindValue::Float(v) => query.bind(*v),
                BindValue::Text(v) => query.bind(v.clone()),
                BindValue::Bool(v) => query.bind(*v),
            };
        }

        let rows = query.fetch_all(&mut *conn).await.map_err(classify)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            out.push(decode_row(row, columns)?);
        }
        Ok(out)
    }
}

/// Decode one engine row into the declared result shape's types.
fn decode_row(row: &PgRow, columns: &[ColumnDef]) -> Result<RowMap> {
    let mut map = RowMap::new();
    for col in columns {
        let name = col.name.as_str();
        let value = match col.column_type {
            ColumnType::Int => row
                .try_get::<Option<i64>, _>(name)
                .map(|v| v.map_or(Value::Null, Value::from)),
            ColumnType::Float => row.try_get::<Option<f64>, _>(name).map(|v| {
                v.and_then(serde_json::Number::from_f64)
                    .map_or(Value::Null, Value::Number)
            }),
            ColumnType::Text => row
                .try_get::<Option<String>, _>(name)
                .map(|v| v.map_or(Value::Null, Value::String)),
            ColumnType::Bool => row
                .try_get::<Option<bool>, _>(name)
                .map(|v| v.map_or(Value::Null, Value::Bool)),
        };
        let value = value.map_err(|e| {
            tracing::debug!(column = name, "row decode failed: {e}");
            Error::query(format!("result column '{name}' did not match its declared type"))
        })?;
        map.insert(col.name.clone(), value);
    }
    Ok(map)
}

/// Collapse an engine failure into the caller-visible taxonomy.
///
/// SQLSTATE 57014 (query_canceled, raised by `statement_timeout`) and 25P03
/// (idle_in_transaction_session_timeout) surface as `Timeout`; transport
/// problems as `ConnectionError`; everything else as a sanitized
/// `QueryError`.
fn classify(err: sqlx::Error) -> Error {
    match err {
        sqlx::Error::PoolTimedOut => Error::timeout("timed out waiting for a connection"),
        sqlx::Error::PoolClosed => Error::connection("connection pool is closed"),
        sqlx::Error::Io(e) => {
            tracing::debug!("data source io error: {e}");
            Error::connection("lost connection to the data source")
        }
        sqlx::Error::Tls(e) => {
            tracing::debug!("data source tls error: {e}");
            Error::connection("tls negotiation with the data source failed")
        }
        sqlx::Error::Protocol(e) => {
            tracing::debug!("data source protocol error: {e}");
            Error::connection("protocol error talking to the data source")
        }
        sqlx::Error::Database(db) => {
            let code = db.code().map(|c| c.to_string()).unwrap_or_default();
            tracing::debug!(sqlstate = %code, "data source rejected query: {db}");
            match code.as_str() {
                "57014" => Error::timeout("statement timeout exceeded"),
                "25P03" => Error::timeout("idle transaction timeout exceeded"),
                "" => Error::query("query rejected by data source"),
                _ => Error::query(format!("query rejected by data source (sqlstate {code})")),
            }
        }
        other => {
            tracing::debug!("query failed: {other}");
            Error::query("query failed")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeout_maps_to_timeout() {
        let err = classify(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, Error::Timeout(_)));
    }

    #[test]
    fn pool_closed_maps_to_connection_error() {
        let err = classify(sqlx::Error::PoolClosed);
        assert!(matches!(err, Error::ConnectionError(_)));
    }

    #[test]
    fn io_maps_to_connection_error() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "broken pipe");
        let err = classify(sqlx::Error::Io(io));
        assert!(matches!(err, Error::ConnectionError(_)));
    }

    #[test]
    fn row_not_found_maps_to_query_error() {
        let err = classify(sqlx::Error::RowNotFound);
        assert!(matches!(err, Error::QueryError(_)));
    }

    #[test]
    fn classified_messages_never_echo_engine_text() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "FATAL: relation \"secret\"");
        let err = classify(sqlx::Error::Io(io));
        assert!(!err.to_string().contains("secret"));
    }
}
