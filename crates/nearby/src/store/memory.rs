use std::{fs, path::Path};

use tracing::info;

use crate::{
    error::{FixtureError, StoreError},
    geo::haversine_m,
    model::{TreeRecord, TreeSite},
    query::NearbyQuery,
    store::TreeStore,
};

/// Trees held in memory and ranked by haversine distance.
#[derive(Clone, Debug, Default)]
pub struct MemoryTreeStore {
    sites: Vec<TreeSite>,
}

impl MemoryTreeStore {
    pub fn new(sites: Vec<TreeSite>) -> Self {
        Self { sites }
    }

    /// Load a JSON array of `{id, boomsoort, boomhoogte, lng, lat}` objects.
    pub fn from_path(path: &Path) -> Result<Self, StoreError> {
        let fixtures = |source: FixtureError| StoreError::Fixtures {
            path: path.to_path_buf(),
            source,
        };
        let raw = fs::read_to_string(path).map_err(|err| fixtures(err.into()))?;
        let sites: Vec<TreeSite> =
            serde_json::from_str(&raw).map_err(|err| fixtures(err.into()))?;
        info!("Loaded {} trees from {}", sites.len(), path.display());
        Ok(Self::new(sites))
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

impl TreeStore for MemoryTreeStore {
    async fn nearest(&self, query: &NearbyQuery) -> Result<Vec<TreeRecord>, StoreError> {
        let mut records: Vec<TreeRecord> = self
            .sites
            .iter()
            .map(|site| TreeRecord::at_distance(site, haversine_m(query.origin, site.position())))
            .collect();
        records.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
        records.truncate(query.limit as usize);
        Ok(records)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}
