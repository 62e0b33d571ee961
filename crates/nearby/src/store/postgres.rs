//! PostGIS-backed store.
//!
//! Ordering uses the `<->` KNN operator so the spatial index does the heavy
//! lifting; distances are geodesic (`geography`) metres.

use std::time::Duration;

use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::info;

use crate::{error::StoreError, model::TreeRecord, query::NearbyQuery, store::TreeStore};

/// Connection settings for [`PgTreeStore::connect`].
#[derive(Clone, Debug)]
pub struct PgStoreOptions {
    pub url: String,
    pub table: String,
    pub geometry_column: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

/// Nearest-tree queries against a PostGIS table of SRID 4326 points.
#[derive(Clone, Debug)]
pub struct PgTreeStore {
    pool: PgPool,
    sql: String,
}

impl PgTreeStore {
    /// Open the shared pool and verify the table/column names.
    pub async fn connect(opts: &PgStoreOptions) -> Result<Self, StoreError> {
        let sql = nearest_sql(&opts.table, &opts.geometry_column)?;
        let pool = PgPoolOptions::new()
            .max_connections(opts.max_connections)
            .acquire_timeout(opts.acquire_timeout)
            .connect(&opts.url)
            .await?;
        info!(
            "Connected to PostgreSQL (pool size {}, table {})",
            opts.max_connections, opts.table
        );
        Ok(Self { pool, sql })
    }

    /// Wrap an existing pool.
    pub fn with_pool(pool: PgPool, table: &str, geometry_column: &str) -> Result<Self, StoreError> {
        Ok(Self {
            pool,
            sql: nearest_sql(table, geometry_column)?,
        })
    }
}

impl TreeStore for PgTreeStore {
    async fn nearest(&self, query: &NearbyQuery) -> Result<Vec<TreeRecord>, StoreError> {
        let rows = sqlx::query_as::<_, TreeRecord>(&self.sql)
            .bind(query.origin.lng)
            .bind(query.origin.lat)
            .bind(i64::from(query.limit))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "postgres"
    }
}

/// Build the KNN query for `table`/`geometry_column`.
///
/// Identifiers cannot be bound as parameters, so they are validated and
/// quoted here instead.
fn nearest_sql(table: &str, geometry_column: &str) -> Result<String, StoreError> {
    let table = quote_qualified(table)?;
    let geom = quote_identifier(geometry_column)?;
    Ok(format!(
        "SELECT t.id::bigint AS id, \
                t.boomsoort::text AS boomsoort, \
                t.boomhoogte::text AS boomhoogte, \
                ST_X(t.{geom})::float8 AS lng, \
                ST_Y(t.{geom})::float8 AS lat, \
                ST_Distance(t.{geom}::geography, q.origin::geography)::float8 AS distance_m \
         FROM {table} AS t, \
              (SELECT ST_SetSRID(ST_MakePoint($1, $2), 4326) AS origin) AS q \
         ORDER BY t.{geom} <-> q.origin \
         LIMIT $3"
    ))
}

fn quote_qualified(name: &str) -> Result<String, StoreError> {
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() > 2 {
        return Err(StoreError::InvalidIdentifier(name.to_string()));
    }
    parts
        .into_iter()
        .map(quote_identifier)
        .collect::<Result<Vec<_>, _>>()
        .map(|parts| parts.join("."))
}

fn quote_identifier(name: &str) -> Result<String, StoreError> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(format!("\"{name}\""))
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_knn_query() {
        let sql = nearest_sql("trees", "geom").unwrap();
        assert!(sql.contains("FROM \"trees\" AS t"));
        assert!(sql.contains("ORDER BY t.\"geom\" <-> q.origin"));
        assert!(sql.contains("ST_MakePoint($1, $2)"));
        assert!(sql.trim_end().ends_with("LIMIT $3"));
    }

    #[test]
    fn accepts_schema_qualified_table() {
        let sql = nearest_sql("public.bomen_2024", "the_geom").unwrap();
        assert!(sql.contains("FROM \"public\".\"bomen_2024\" AS t"));
        assert!(sql.contains("t.\"the_geom\"::geography"));
    }

    #[test]
    fn rejects_injection_in_identifiers() {
        for bad in ["trees; DROP TABLE trees", "a.b.c", "", "1trees", "tr\"ees", "public."] {
            assert!(
                matches!(nearest_sql(bad, "geom"), Err(StoreError::InvalidIdentifier(_))),
                "{bad:?} should be rejected"
            );
        }
        assert!(matches!(
            nearest_sql("trees", "geom--"),
            Err(StoreError::InvalidIdentifier(_))
        ));
    }
}
