//! Opens the store selected by [`config::store_backend`].

use crate::infra::config::{self, StoreBackend};
use crate::storage::{MemoryStore, PostgresStore, RacingStore};
use std::sync::Arc;

pub async fn open_store() -> anyhow::Result<Arc<dyn RacingStore>> {
    match config::store_backend()? {
        StoreBackend::Memory => {
            tracing::warn!("using the in-memory store; data is lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let store = connect_postgres().await?;
            if config::run_migrations()? {
                store.migrate().await?;
                tracing::info!("migrations applied");
            }
            Ok(Arc::new(store))
        }
    }
}

pub async fn connect_postgres() -> anyhow::Result<PostgresStore> {
    let url = config::database_url()?;
    let max_connections = config::db_max_connections()?;
    let store = PostgresStore::connect(&url, max_connections).await?;
    tracing::info!(max_connections, "connected to PostgreSQL");
    Ok(store)
}
