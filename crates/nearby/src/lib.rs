//! Nearest-tree lookups shared by the HTTP service and the CLI.
//!
//! The crate is split into focused modules:
//! - `query`: request parameter parsing and validation.
//! - `model`: store rows and the JSON shapes returned to clients.
//! - `geo`: great-circle distance helpers.
//! - `store`: the `TreeStore` seam with PostGIS and in-memory backends.
//! - `error`: error types surfaced by parsing and storage.

pub mod error;
pub mod geo;
pub mod model;
pub mod query;
pub mod store;

pub use error::{QueryError, StoreError};
pub use model::{Coordinate, NearbyTrees, Tree, TreeRecord, TreeSite};
pub use query::{DEFAULT_LIMIT, NearbyParams, NearbyQuery};
pub use store::{
    Backend, TreeStore, find_nearby,
    memory::MemoryTreeStore,
    postgres::{PgStoreOptions, PgTreeStore},
};
