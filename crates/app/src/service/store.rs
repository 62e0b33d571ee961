use anyhow::{Context, Result};
use nearby::{Backend, MemoryTreeStore, PgTreeStore};
use tracing::info;

use crate::service::config::StoreConfig;

/// Open the configured store. The PostgreSQL pool is created here, once per
/// process, and shared by every request afterwards.
pub(crate) async fn open_store(config: &StoreConfig) -> Result<Backend> {
    info!(store = ?config.kind(), "Opening tree store");
    match config {
        StoreConfig::Postgres(opts) => {
            let store = PgTreeStore::connect(opts)
                .await
                .context("Failed to connect to the spatial database")?;
            Ok(Backend::Postgres(store))
        }
        StoreConfig::Memory { fixtures } => {
            let store = MemoryTreeStore::from_path(fixtures)
                .context("Failed to load the in-memory tree store")?;
            info!("Serving {} trees from memory", store.len());
            Ok(Backend::Memory(store))
        }
    }
}
