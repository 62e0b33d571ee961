//! Turning raw parameters into the endpoint's status and JSON body.
//!
//! Shared by the HTTP handler and the one-shot `query` command so both
//! answer identically.

use std::time::Instant;

use actix_web::http::StatusCode;
use nearby::{NearbyParams, NearbyQuery, NearbyTrees, TreeStore, find_nearby};
use serde::Serialize;
use tracing::{Instrument, error, field, info_span, warn};

use crate::service::telemetry::{self, Outcome};

pub(crate) const NO_TREES_MESSAGE: &str = "No trees found near this location";
pub(crate) const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Everything a nearest-tree request can end in.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum NearbyReply {
    Found(NearbyTrees),
    Empty { message: &'static str },
    Rejected { error: String },
    Failed { error: &'static str },
}

impl NearbyReply {
    pub(crate) fn status(&self) -> StatusCode {
        match self {
            NearbyReply::Found(_) | NearbyReply::Empty { .. } => StatusCode::OK,
            NearbyReply::Rejected { .. } => StatusCode::BAD_REQUEST,
            NearbyReply::Failed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn outcome(&self) -> Outcome {
        match self {
            NearbyReply::Found(_) => Outcome::Ok,
            NearbyReply::Empty { .. } => Outcome::Empty,
            NearbyReply::Rejected { .. } => Outcome::BadRequest,
            NearbyReply::Failed { .. } => Outcome::Error,
        }
    }
}

/// Validate `params`, query `store`, and shape the reply.
pub(crate) async fn answer<S: TreeStore>(store: &S, params: NearbyParams) -> NearbyReply {
    let span = info_span!(
        "nearby.request",
        lat = field::Empty,
        lng = field::Empty,
        limit = field::Empty,
        outcome = field::Empty
    );

    let reply = match NearbyQuery::try_from(params) {
        Ok(query) => {
            span.record("lat", query.origin.lat);
            span.record("lng", query.origin.lng);
            span.record("limit", query.limit);
            lookup(store, &query).instrument(span.clone()).await
        }
        Err(err) => {
            span.in_scope(|| warn!("Rejected nearest-tree request: {err}"));
            NearbyReply::Rejected {
                error: err.to_string(),
            }
        }
    };

    let outcome = reply.outcome();
    span.record("outcome", outcome.label());
    telemetry::record_outcome(outcome);
    reply
}

async fn lookup<S: TreeStore>(store: &S, query: &NearbyQuery) -> NearbyReply {
    let started = Instant::now();
    let result = find_nearby(store, query).await;
    telemetry::record_query_time(started.elapsed());

    match result {
        Ok(Some(found)) => NearbyReply::Found(found),
        Ok(None) => NearbyReply::Empty {
            message: NO_TREES_MESSAGE,
        },
        Err(err) => {
            error!(store = store.kind(), "Nearest-tree query failed: {err:?}");
            NearbyReply::Failed {
                error: INTERNAL_ERROR_MESSAGE,
            }
        }
    }
}
