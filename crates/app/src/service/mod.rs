//! Nearest-tree HTTP service.
//!
//! The module is split into focused submodules:
//! - `config`: CLI configuration parsing.
//! - `store`: opening the configured store once per process.
//! - `reply`: request validation, lookup, and response shaping.
//! - `server`: Actix Web routes.
//! - `telemetry`: tracing and Prometheus setup.

pub use config::{QueryArgs, ServeArgs, ServiceConfig, StoreConfig};

mod config;
mod reply;
mod server;
mod store;
mod telemetry;

use anyhow::{Result, bail};

/// Run the HTTP service until interrupted.
pub fn serve(args: ServeArgs) -> Result<()> {
    let config = ServiceConfig::try_from(args)?;
    telemetry::init_tracing();
    actix_web::rt::System::new().block_on(server::serve(config))
}

/// Answer a single nearest-tree query and print the JSON body to stdout.
pub fn query(args: QueryArgs) -> Result<()> {
    telemetry::init_tracing();
    let params = args.params();
    let store_config = StoreConfig::try_from(args.store)?;

    actix_web::rt::System::new().block_on(async move {
        let store = store::open_store(&store_config).await?;
        let reply = reply::answer(&store, params).await;
        println!("{}", serde_json::to_string_pretty(&reply)?);
        if !reply.status().is_success() {
            bail!("query failed with status {}", reply.status());
        }
        Ok::<(), anyhow::Error>(())
    })
}
