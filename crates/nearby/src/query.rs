//! Request parameter parsing for nearest-tree lookups.
//!
//! Parameters arrive as raw strings so that missing, blank and malformed
//! values can be told apart and answered with the right client error.

use crate::{error::QueryError, model::Coordinate};

/// Result count used when `limit` is absent or unusable.
pub const DEFAULT_LIMIT: u32 = 1;

/// Raw query-string parameters as received over HTTP.
#[derive(Clone, Debug, Default)]
pub struct NearbyParams {
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub limit: Option<String>,
}

/// A validated nearest-tree query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NearbyQuery {
    pub origin: Coordinate,
    pub limit: u32,
}

impl NearbyParams {
    /// Collect parameters from decoded query-string pairs.
    ///
    /// Repeated keys keep their first value and unknown keys are ignored, so
    /// a query string never fails to produce parameters.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "lat" => &mut params.lat,
                "lng" => &mut params.lng,
                "limit" => &mut params.limit,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into());
            }
        }
        params
    }
}

impl NearbyQuery {
    pub fn new(origin: Coordinate, limit: u32) -> Self {
        Self {
            origin,
            limit: limit.max(1),
        }
    }
}

impl TryFrom<NearbyParams> for NearbyQuery {
    type Error = QueryError;

    fn try_from(params: NearbyParams) -> Result<Self, QueryError> {
        let (lat, lng) = match (present(&params.lat), present(&params.lng)) {
            (Some(lat), Some(lng)) => (lat, lng),
            _ => return Err(QueryError::MissingCoordinates),
        };

        let lat = parse_coordinate(lat)?;
        let lng = parse_coordinate(lng)?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(QueryError::OutOfRange);
        }

        Ok(Self {
            origin: Coordinate::new(lat, lng),
            limit: parse_limit(params.limit.as_deref()),
        })
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn parse_coordinate(raw: &str) -> Result<f64, QueryError> {
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or(QueryError::InvalidCoordinates)
}

/// Parse a positive result count, falling back to [`DEFAULT_LIMIT`].
///
/// Counts beyond `u32::MAX` saturate rather than fall back.
pub fn parse_limit(raw: Option<&str>) -> u32 {
    raw.map(str::trim)
        .and_then(|value| value.parse::<i128>().ok())
        .filter(|value| *value > 0)
        .map(|value| u32::try_from(value).unwrap_or(u32::MAX))
        .unwrap_or(DEFAULT_LIMIT)
}
