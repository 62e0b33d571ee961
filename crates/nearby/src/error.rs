use std::path::PathBuf;

use thiserror::Error;

/// Rejections raised while turning request parameters into a [`NearbyQuery`].
///
/// The `Display` text is sent to clients verbatim, so it must not carry
/// anything beyond what the caller already supplied.
///
/// [`NearbyQuery`]: crate::NearbyQuery
#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    #[error("Latitude and longitude are required")]
    MissingCoordinates,
    #[error("Latitude and longitude must be valid numbers")]
    InvalidCoordinates,
    #[error("Latitude must be between -90 and 90 and longitude between -180 and 180")]
    OutOfRange,
}

/// Failures raised by a [`TreeStore`](crate::TreeStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error")]
    Database(#[from] sqlx::Error),
    #[error("invalid SQL identifier {0:?}")]
    InvalidIdentifier(String),
    #[error("failed to load tree fixtures from {path:?}")]
    Fixtures {
        path: PathBuf,
        #[source]
        source: FixtureError,
    },
}

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
