//! Store rows and the JSON shapes handed back to clients.

use serde::{Deserialize, Serialize};

/// A point in WGS84 decimal degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A tree as seeded into a fixture file, without any query context.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TreeSite {
    pub id: i64,
    #[serde(default)]
    pub boomsoort: Option<String>,
    #[serde(default)]
    pub boomhoogte: Option<String>,
    pub lng: f64,
    pub lat: f64,
}

impl TreeSite {
    pub fn position(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

/// One row returned by a store: a tree plus its unrounded distance from the
/// query point.
#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct TreeRecord {
    pub id: i64,
    pub boomsoort: Option<String>,
    pub boomhoogte: Option<String>,
    pub lng: f64,
    pub lat: f64,
    pub distance_m: f64,
}

impl TreeRecord {
    pub fn at_distance(site: &TreeSite, distance_m: f64) -> Self {
        Self {
            id: site.id,
            boomsoort: site.boomsoort.clone(),
            boomhoogte: site.boomhoogte.clone(),
            lng: site.lng,
            lat: site.lat,
            distance_m,
        }
    }
}

/// Wire shape of a single tree.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Tree {
    pub id: i64,
    pub boomsoort: Option<String>,
    pub boomhoogte: Option<String>,
    /// GeoJSON order: `[lng, lat]`.
    pub coordinates: [f64; 2],
    /// Metres from the query point, rounded to the nearest integer.
    pub distance: u64,
}

impl From<TreeRecord> for Tree {
    fn from(record: TreeRecord) -> Self {
        Self {
            id: record.id,
            boomsoort: record.boomsoort,
            boomhoogte: record.boomhoogte,
            coordinates: [record.lng, record.lat],
            distance: round_metres(record.distance_m),
        }
    }
}

fn round_metres(distance_m: f64) -> u64 {
    if distance_m.is_finite() && distance_m > 0.0 {
        distance_m.round() as u64
    } else {
        0
    }
}

/// Successful nearest-tree response body.
///
/// Only constructible with at least one tree, so `closest` is always the
/// first entry of `trees`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyTrees {
    success: bool,
    user_location: Coordinate,
    trees: Vec<Tree>,
    closest: Tree,
}

impl NearbyTrees {
    /// Rank `records` by ascending distance and shape them for the client.
    ///
    /// Returns `None` when there is nothing to report.
    pub fn from_records(origin: Coordinate, mut records: Vec<TreeRecord>) -> Option<Self> {
        // Stores already order rows, but planar index order can disagree with
        // geodesic distance by a few centimetres. Sort on the unrounded value.
        records.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));

        let trees: Vec<Tree> = records.into_iter().map(Tree::from).collect();
        let closest = trees.first()?.clone();
        Some(Self {
            success: true,
            user_location: origin,
            trees,
            closest,
        })
    }

    pub fn user_location(&self) -> Coordinate {
        self.user_location
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn closest(&self) -> &Tree {
        &self.closest
    }
}
