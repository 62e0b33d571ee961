//! Configuration parsing for the nearby-trees service.
//!
//! This module owns translation of CLI arguments (and their environment
//! fallbacks) into validated config structs which the server and the one-shot
//! query command use without re-parsing flags.

use std::{net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::{Result, anyhow, bail};
use clap::{Args, ValueEnum};
use nearby::{NearbyParams, PgStoreOptions};

/// Result count the map page requests unless configured otherwise.
pub(crate) const DEFAULT_MAP_LIMIT: u32 = 50;

/// Backend answering nearest-tree queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// PostGIS table reached through a connection pool.
    Postgres,
    /// JSON fixture file held in memory.
    Memory,
}

/// Validated store settings.
#[derive(Clone, Debug)]
pub enum StoreConfig {
    Postgres(PgStoreOptions),
    Memory { fixtures: PathBuf },
}

impl StoreConfig {
    pub(crate) fn kind(&self) -> StoreKind {
        match self {
            StoreConfig::Postgres(_) => StoreKind::Postgres,
            StoreConfig::Memory { .. } => StoreKind::Memory,
        }
    }
}

/// Canonical configuration for the HTTP service.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// Socket address the HTTP server listens on.
    pub bind: SocketAddr,
    /// Store answering nearest-tree queries.
    pub store: StoreConfig,
    /// Result count requested by the map page.
    pub map_limit: u32,
    /// HTTP worker threads; `None` keeps the actix default.
    pub workers: Option<usize>,
    /// Expose Prometheus metrics at `/metrics`.
    pub metrics: bool,
}

/// Store selection shared by every subcommand.
#[derive(Debug, Args)]
pub struct StoreArgs {
    /// Store backend.
    #[arg(long = "store", value_enum, env = "NEARBY_STORE", default_value = "postgres")]
    pub(crate) store: StoreKind,
    /// PostgreSQL connection URL (postgres store).
    #[arg(long = "database-url", env = "DATABASE_URL", value_name = "URL", hide_env_values = true)]
    pub(crate) database_url: Option<String>,
    /// JSON file of trees (memory store).
    #[arg(long = "fixtures", env = "NEARBY_FIXTURES", value_name = "PATH")]
    pub(crate) fixtures: Option<PathBuf>,
    /// Table holding tree rows, optionally schema-qualified.
    #[arg(long = "table", env = "NEARBY_TABLE", default_value = "trees")]
    pub(crate) table: String,
    /// Point geometry column (SRID 4326).
    #[arg(long = "geometry-column", env = "NEARBY_GEOMETRY_COLUMN", default_value = "geom")]
    pub(crate) geometry_column: String,
    /// Maximum pooled database connections.
    #[arg(long = "max-connections", env = "NEARBY_MAX_CONNECTIONS", default_value_t = 5)]
    pub(crate) max_connections: u32,
    /// Seconds to wait for a pooled connection.
    #[arg(long = "acquire-timeout-secs", value_name = "SECS", default_value_t = 5)]
    pub(crate) acquire_timeout_secs: u64,
}

/// CLI arguments accepted by the `serve` subcommand.
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(long = "bind", env = "NEARBY_BIND", default_value = "0.0.0.0:8080")]
    pub(crate) bind: SocketAddr,
    #[command(flatten)]
    pub(crate) store: StoreArgs,
    /// Number of trees the map page requests.
    #[arg(long = "map-limit", env = "NEARBY_MAP_LIMIT", default_value_t = DEFAULT_MAP_LIMIT)]
    pub(crate) map_limit: u32,
    /// HTTP worker threads.
    #[arg(long = "workers", value_name = "N")]
    pub(crate) workers: Option<usize>,
    /// Disable the Prometheus endpoint.
    #[arg(long = "no-metrics", action = clap::ArgAction::SetTrue)]
    pub(crate) no_metrics: bool,
}

/// CLI arguments accepted by the `query` subcommand.
#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Latitude in decimal degrees.
    #[arg(long = "lat", allow_hyphen_values = true)]
    pub(crate) lat: String,
    /// Longitude in decimal degrees.
    #[arg(long = "lng", allow_hyphen_values = true)]
    pub(crate) lng: String,
    /// Number of trees to return.
    #[arg(long = "limit", allow_hyphen_values = true)]
    pub(crate) limit: Option<String>,
    #[command(flatten)]
    pub(crate) store: StoreArgs,
}

impl QueryArgs {
    /// Raw parameters, validated the same way as the HTTP endpoint.
    pub(crate) fn params(&self) -> NearbyParams {
        NearbyParams {
            lat: Some(self.lat.clone()),
            lng: Some(self.lng.clone()),
            limit: self.limit.clone(),
        }
    }
}

impl TryFrom<StoreArgs> for StoreConfig {
    type Error = anyhow::Error;

    fn try_from(args: StoreArgs) -> Result<Self> {
        match args.store {
            StoreKind::Memory => {
                let fixtures = args.fixtures.ok_or_else(|| {
                    anyhow!("Missing fixtures. Provide --fixtures <path> for the memory store.")
                })?;
                Ok(StoreConfig::Memory { fixtures })
            }
            StoreKind::Postgres => {
                let url = args.database_url.ok_or_else(|| {
                    anyhow!("Missing database URL. Provide --database-url or set DATABASE_URL.")
                })?;
                if args.max_connections == 0 {
                    bail!("--max-connections must be at least 1");
                }
                if args.acquire_timeout_secs == 0 {
                    bail!("--acquire-timeout-secs must be at least 1");
                }
                Ok(StoreConfig::Postgres(PgStoreOptions {
                    url,
                    table: args.table,
                    geometry_column: args.geometry_column,
                    max_connections: args.max_connections,
                    acquire_timeout: Duration::from_secs(args.acquire_timeout_secs),
                }))
            }
        }
    }
}

impl TryFrom<ServeArgs> for ServiceConfig {
    type Error = anyhow::Error;

    fn try_from(args: ServeArgs) -> Result<Self> {
        if args.map_limit == 0 {
            bail!("--map-limit must be at least 1");
        }
        if args.workers == Some(0) {
            bail!("--workers must be at least 1");
        }

        Ok(Self {
            bind: args.bind,
            store: StoreConfig::try_from(args.store)?,
            map_limit: args.map_limit,
            workers: args.workers,
            metrics: !args.no_metrics,
        })
    }
}
