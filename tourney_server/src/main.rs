//! Single-elimination bracket server.
//!
//! Serves the bracket engine over HTTP, backed by PostgreSQL or, for local
//! runs, by process memory.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Error;
use pico_args::Arguments;
use tourney::{BracketManager, BracketStore, Database, MemoryBracketStore, PgBracketStore};
use tourney_server::{
    api,
    config::{CliOverrides, ServerConfig, StoreBackend},
    logging, metrics,
};

const HELP: &str = "\
Run a single-elimination bracket server

USAGE:
  tourney_server [OPTIONS]

OPTIONS:
  --bind          IP:PORT  Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]
  --db-url        URL      Database connection string  [default: env DATABASE_URL]
  --metrics-bind  IP:PORT  Prometheus exporter address [default: env METRICS_BIND or disabled]

FLAGS:
  --memory                 Keep brackets in process memory instead of PostgreSQL
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL             PostgreSQL connection string
  BRACKET_STORE            postgres or memory
  BRACKET_MAX_ATTEMPTS     Attempts per operation on transient conflicts
  BRACKET_TX_TIMEOUT_SECS  Transaction timeout in seconds
  RUST_LOG                 Log filter (e.g., info,tourney=debug)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let overrides = CliOverrides {
        bind: pargs.opt_value_from_str::<_, SocketAddr>("--bind")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
        metrics_bind: pargs.opt_value_from_str::<_, SocketAddr>("--metrics-bind")?,
        memory_store: pargs.contains("--memory"),
    };

    logging::init();

    let config = ServerConfig::from_env(overrides)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(|e| anyhow::anyhow!(e))?;
        tracing::info!("Prometheus metrics exported at http://{}/metrics", addr);
    }

    let store: Arc<dyn BracketStore> = match config.store {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; brackets are lost on exit");
            Arc::new(MemoryBracketStore::new())
        }
        StoreBackend::Postgres => {
            tracing::info!("Connecting to database");
            let db = Database::new(&config.database)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
            tracing::info!("Database connected successfully");
            Arc::new(PgBracketStore::new(Arc::new(db.pool().clone())))
        }
    };

    let manager = BracketManager::with_config(store, config.engine.clone());
    let app = api::create_router(api::AppState::new(manager));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    tracing::info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    tracing::info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for CTRL+C: {}", e);
        std::future::pending::<()>().await;
    }
}
