// HTTP routes: JSON views over the loaded series

mod http;

use axum::{Router, routing::get};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

use crate::cache::SeriesCache;
use crate::config::AppConfig;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) cache: Arc<SeriesCache>,
    pub(crate) config: AppConfig,
}

pub fn app(config: AppConfig) -> Router {
    let cache = Arc::new(SeriesCache::new(Duration::from_secs(
        config.dashboard.cache_ttl_secs,
    )));
    app_with_cache(config, cache)
}

/// Router over an existing cache (shared with other components or tests).
pub fn app_with_cache(config: AppConfig, cache: Arc<SeriesCache>) -> Router {
    let state = AppState { cache, config };
    Router::new()
        .route("/", get(|| async { "clusterstats: cluster telemetry metrics" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/filters", get(http::filters_handler)) // GET /api/filters
        .route("/api/query", get(http::query_handler)) // GET /api/query
        .route("/api/delta/{metric}", get(http::delta_handler)) // GET /api/delta/{metric}
        .route("/api/export", get(http::export_handler)) // GET /api/export
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
