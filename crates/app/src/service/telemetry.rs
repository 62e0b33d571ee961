//! Telemetry helpers for tracing output and Prometheus metrics.

use std::{sync::OnceLock, thread, time::Duration};

use anyhow::{Context, Result, anyhow};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Counter of answered nearest-tree requests, labelled by outcome.
pub(crate) const REQUESTS_TOTAL: &str = "nearby_requests_total";
/// Histogram of time spent in the store per request.
pub(crate) const QUERY_SECONDS: &str = "nearby_query_seconds";

/// How a nearest-tree request ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    Ok,
    Empty,
    BadRequest,
    Error,
}

impl Outcome {
    /// Label used in log messages and metrics.
    pub(crate) fn label(self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::Empty => "empty",
            Outcome::BadRequest => "bad_request",
            Outcome::Error => "error",
        }
    }
}

/// Install the global tracing subscriber. Later calls are no-ops.
pub(crate) fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_timer(fmt::time::uptime())
                .with_filter(env_filter),
        )
        .try_init();
}

/// Ensure the global metrics recorder is installed and return the Prometheus handle.
pub(crate) fn init_metrics_recorder() -> Result<&'static PrometheusHandle> {
    if let Some(handle) = PROM_HANDLE.get() {
        return Ok(handle);
    }

    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    metrics::set_global_recorder(recorder)
        .map_err(|err| anyhow!("metrics recorder already installed: {err}"))?;

    let upkeep_handle = handle.clone();
    thread::Builder::new()
        .name("prometheus-upkeep".into())
        .spawn(move || {
            loop {
                thread::sleep(Duration::from_secs(5));
                upkeep_handle.run_upkeep();
            }
        })
        .context("Failed to spawn prometheus upkeep thread")?;

    Ok(PROM_HANDLE.get_or_init(|| handle))
}

pub(crate) fn record_outcome(outcome: Outcome) {
    metrics::counter!(REQUESTS_TOTAL, "outcome" => outcome.label()).increment(1);
}

pub(crate) fn record_query_time(elapsed: Duration) {
    metrics::histogram!(QUERY_SECONDS).record(elapsed.as_secs_f64());
}
