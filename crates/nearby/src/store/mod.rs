//! Storage backends answering nearest-tree queries.
//!
//! - `postgres`: PostGIS-backed store sharing one connection pool.
//! - `memory`: fixture-backed store for local runs and tests.

use std::future::Future;

use tracing::debug;

use crate::{
    error::StoreError,
    model::{NearbyTrees, TreeRecord},
    query::NearbyQuery,
};

pub mod memory;
pub mod postgres;

/// A read-only source of trees ordered by distance.
pub trait TreeStore: Send + Sync {
    /// Up to `query.limit` trees nearest to `query.origin`, closest first.
    fn nearest(
        &self,
        query: &NearbyQuery,
    ) -> impl Future<Output = Result<Vec<TreeRecord>, StoreError>> + Send;

    /// Cheap liveness probe.
    fn ping(&self) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Short label used in logs.
    fn kind(&self) -> &'static str;
}

/// Run `query` against `store` and shape the response.
///
/// `Ok(None)` means the store holds no trees to report.
pub async fn find_nearby<S: TreeStore>(
    store: &S,
    query: &NearbyQuery,
) -> Result<Option<NearbyTrees>, StoreError> {
    let records = store.nearest(query).await?;
    debug!(store = store.kind(), rows = records.len(), "nearest query answered");
    Ok(NearbyTrees::from_records(query.origin, records))
}

/// Store chosen at startup.
pub enum Backend {
    Postgres(postgres::PgTreeStore),
    Memory(memory::MemoryTreeStore),
}

impl TreeStore for Backend {
    async fn nearest(&self, query: &NearbyQuery) -> Result<Vec<TreeRecord>, StoreError> {
        match self {
            Backend::Postgres(store) => store.nearest(query).await,
            Backend::Memory(store) => store.nearest(query).await,
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        match self {
            Backend::Postgres(store) => store.ping().await,
            Backend::Memory(store) => store.ping().await,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Backend::Postgres(store) => store.kind(),
            Backend::Memory(store) => store.kind(),
        }
    }
}
