//! Home poker ledger server.
//!
//! Serves the ledger API over HTTP, backed by PostgreSQL or, for local runs,
//! an in-memory store.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Error};
use pico_args::Arguments;
use pl_server::{
    api::{self, auth::TokenVerifier},
    config::{CliOverrides, ServerConfig, StoreBackend},
    logging,
};
use poker_ledger::{
    GameManager,
    db::{Database, LedgerStore, MemoryLedgerStore, PgLedgerStore},
};
use tracing::{info, warn};

const HELP: &str = "\
Run the home poker ledger server

USAGE:
  pl_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]

FLAGS:
  --memory                 Keep ledger rows in memory instead of PostgreSQL
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL             PostgreSQL connection string
  JWT_SECRET               Shared secret of the identity provider (required)
  LEDGER_STORE             postgres | memory
  (See .env file for all configuration options)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }

    let overrides = CliOverrides {
        bind: pargs
            .opt_value_from_str::<_, SocketAddr>("--bind")
            .context("Invalid --bind address")?,
        database_url: pargs
            .opt_value_from_str("--db-url")
            .context("Invalid --db-url")?,
        memory: pargs.contains("--memory"),
    };

    logging::init();

    let config = ServerConfig::from_env(overrides)?;
    config.validate()?;

    let store: Arc<dyn LedgerStore> = match config.store {
        StoreBackend::Postgres => {
            info!("Connecting to database");
            let db = Database::new(&config.database)
                .await
                .context("Failed to connect to database")?;
            db.migrate().await.context("Failed to run migrations")?;
            info!("Database connected and migrated");
            Arc::new(PgLedgerStore::new(Arc::new(db.pool().clone())))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory ledger store; data is lost on shutdown");
            Arc::new(MemoryLedgerStore::new())
        }
    };

    let state = api::AppState {
        game_manager: Arc::new(GameManager::new(store)),
        token_verifier: Arc::new(TokenVerifier::new(&config.security.jwt_secret)),
    };
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}
