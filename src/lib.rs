// Cluster telemetry engine: ingest -> derive -> query / downsample / delta.
// cache, config, export and routes are the serving layer around it.

pub mod cache;
pub mod config;
pub mod delta;
pub mod derive;
pub mod downsample;
pub mod export;
pub mod ingest;
pub mod logging;
pub mod models;
pub mod query;
pub mod routes;
pub mod version;
