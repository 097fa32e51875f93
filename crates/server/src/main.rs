//! Tasks server
//!
//! Serves the Tasks REST resource over a SQLite primary store and a SQLite
//! search index kept in sync with it.

use std::sync::Arc;

use clap::Parser;
use tasks_persistence::composite::CompositeStorage;
use tasks_persistence::core::IndexMaintenance;
use tasks_rest::{ServerConfig, create_app_with_config, init_logging};
use tracing::{info, warn};

#[cfg(feature = "sqlite")]
use tasks_persistence::backends::sqlite::{SqliteBackend, SqliteSearchIndex};

/// Creates and initializes the primary store and the search index.
#[cfg(feature = "sqlite")]
fn create_sqlite_stores(
    config: &ServerConfig,
) -> anyhow::Result<(Arc<SqliteBackend>, Arc<SqliteSearchIndex>)> {
    info!(database = %config.database_url, "Initializing SQLite primary store");
    let primary = SqliteBackend::open(&config.database_url)?;
    primary.init_schema()?;

    info!(index = %config.index_url, "Initializing SQLite search index");
    let index = SqliteSearchIndex::open(&config.index_url)?;
    index.init_schema()?;

    Ok((Arc::new(primary), Arc::new(index)))
}

/// Starts the Axum HTTP server.
async fn serve(app: axum::Router, config: &ServerConfig) -> anyhow::Result<()> {
    let addr = config.socket_addr();
    info!(address = %addr, "Server listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    info!(
        port = config.port,
        host = %config.host,
        sync_mode = %config.sync_mode,
        "Starting Tasks server"
    );

    start_sqlite(config).await
}

/// Starts the server with the SQLite primary store and search index.
#[cfg(feature = "sqlite")]
async fn start_sqlite(config: ServerConfig) -> anyhow::Result<()> {
    let (primary, index) = create_sqlite_stores(&config)?;
    let storage = CompositeStorage::new(config.to_sync_config(), primary, index);

    if config.reindex_on_startup {
        match storage.reconcile().await {
            Ok(result) => info!(
                primary = result.primary_count,
                indexed = result.index_count,
                differences = result.differences,
                repaired = result.repaired,
                "Search index reconciled on startup"
            ),
            Err(e) => warn!(error = %e, "Startup reconciliation failed, index will catch up on writes"),
        }
    }

    let app = create_app_with_config(storage, config.clone());
    serve(app, &config).await
}

/// Fallback when sqlite feature is not enabled.
#[cfg(not(feature = "sqlite"))]
async fn start_sqlite(_config: ServerConfig) -> anyhow::Result<()> {
    anyhow::bail!(
        "The server requires the 'sqlite' feature. \
         Build with: cargo build -p tasks-server --features sqlite"
    )
}
