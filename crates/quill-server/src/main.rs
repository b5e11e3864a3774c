//! Quill Server — application entry point.

mod config;
mod error;
mod routes;
mod state;

use quill_db::store::{SurrealNoteStore, SurrealTenantStore, SurrealUserStore};
use quill_db::{DbManager, MemoryStore};
use tracing_subscriber::EnvFilter;

use crate::config::{ServerConfig, StoreBackend};
use crate::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("quill=info".parse().expect("valid directive")))
        .json()
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Server failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, backend = ?config.backend, "Starting Quill server");

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;

    match config.backend {
        StoreBackend::Memory => {
            let store = MemoryStore::new();
            let state = AppState::new(store.clone(), store.clone(), store, config.auth);
            axum::serve(listener, routes::router(state)).await?;
        }
        StoreBackend::Surreal => {
            let manager = DbManager::connect(&config.db).await?;
            quill_db::run_migrations(manager.client()).await?;

            let db = manager.client().clone();
            let timeout = manager.operation_timeout();
            let state = AppState::new(
                SurrealTenantStore::with_timeout(db.clone(), timeout),
                SurrealUserStore::with_timeout(db.clone(), timeout),
                SurrealNoteStore::with_timeout(db, timeout),
                config.auth,
            );
            axum::serve(listener, routes::router(state)).await?;
        }
    }

    tracing::info!("Quill server stopped");
    Ok(())
}
