//! Hospital bridge entry point.
//!
//! Startup is fail-fast: a catalog declaration that is not read-only or a
//! data source that cannot be reached aborts the process before the endpoint
//! accepts a single request.

use clap::Parser;
use std::sync::Arc;

use hospital_bridge::db::PgAdapter;
use hospital_bridge::rpc::RpcServer;
use hospital_bridge::tools::{hospital, Dispatcher};
use hospital_bridge::types::{Config, DbConfig, PoolConfig};

#[derive(Parser, Debug)]
#[command(name = "hospital-bridge", version, about = "Read-only MCP bridge for hospital data")]
struct Args {
    /// Data source host.
    #[arg(long, env = "DB_HOST", default_value = "localhost")]
    db_host: String,

    /// Data source port.
    #[arg(long, env = "DB_PORT", default_value_t = 5432)]
    db_port: u16,

    /// Database name.
    #[arg(long, env = "DB_NAME")]
    db_name: String,

    /// Database user (SELECT-only principal on the restricted views).
    #[arg(long, env = "DB_USER")]
    db_user: String,

    /// Database password.
    #[arg(long, env = "DB_PASSWORD", hide_env_values = true)]
    db_password: String,

    /// Maximum pooled connections.
    #[arg(long, env = "BRIDGE_POOL_SIZE", default_value_t = 5)]
    pool_size: u32,
}

impl Args {
    fn into_config(self) -> Config {
        Config {
            db: DbConfig {
                host: self.db_host,
                port: self.db_port,
                database: self.db_name,
                user: self.db_user,
                password: self.db_password,
            },
            pool: PoolConfig {
                max_connections: self.pool_size,
                ..PoolConfig::default()
            },
            rpc: Default::default(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Args::parse().into_config();

    hospital_bridge::observability::init_tracing();

    // Catalog validation failure is process-fatal by design.
    let catalog = Arc::new(hospital::build_catalog()?);
    tracing::info!(tools = catalog.len(), "tool catalog validated");

    // So is total loss of data-source connectivity at startup.
    let adapter = PgAdapter::connect(&config.db, &config.pool).await?;

    let dispatcher = Dispatcher::new(catalog, Arc::new(adapter.clone()));
    let server = RpcServer::new(dispatcher, config.rpc.clone());

    tokio::select! {
        result = server.serve() => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupt received");
            server.shutdown();
        }
    }

    adapter.close().await;
    Ok(())
}
