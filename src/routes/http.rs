// GET handlers: version, filters, query, delta, export

use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Deserializer, Serialize};

use super::AppState;
use crate::cache::LoadedSeries;
use crate::delta::{Delta, delta};
use crate::downsample::downsample;
use crate::export;
use crate::ingest::{self, IngestReport};
use crate::models::{DerivedSnapshot, Metric, Series, UnknownMetric};
use crate::query::{self, SummaryStats, TimeFilter};
use crate::version::{NAME, VERSION};

/// Metrics shown as headline deltas in /api/query.
const HEADLINE_METRICS: [Metric; 4] = [
    Metric::CpuPercent,
    Metric::NodeUtilization,
    Metric::JobsRunning,
    Metric::JobsQueued,
];

pub(super) struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        tracing::warn!(error = %e, "request failed");
        ApiError(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}

/// Smallest `max_points` that still keeps both the first and the latest row.
const MIN_POINTS: usize = 2;

#[derive(Debug, Default, Deserialize)]
pub(super) struct FilterParams {
    #[serde(default, deserialize_with = "blank_as_none")]
    year: Option<i32>,
    #[serde(default, deserialize_with = "blank_as_none")]
    month: Option<u32>,
    #[serde(default, deserialize_with = "blank_as_none")]
    day: Option<u32>,
    #[serde(default, deserialize_with = "blank_as_none")]
    max_points: Option<usize>,
}

/// `?year=` means "any year", same as leaving the parameter out.
fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

impl FilterParams {
    fn filter(&self) -> TimeFilter {
        TimeFilter {
            year: self.year,
            month: self.month,
            day: self.day,
        }
    }
}

#[derive(Debug, Serialize)]
struct FiltersResponse {
    years: Vec<i32>,
    months: Vec<u32>,
    days: Vec<u32>,
}

#[derive(Debug, Serialize)]
struct QueryResponse<'a> {
    count: usize,
    filter: TimeFilter,
    summary: SummaryStats,
    latest: Option<DerivedSnapshot>,
    deltas: BTreeMap<Metric, Delta>,
    points: Series,
    report: &'a IngestReport,
}

/// Resolves configured sources and loads them through the cache. File I/O runs
/// on the blocking pool.
async fn load(state: &AppState) -> Result<Arc<LoadedSeries>, ApiError> {
    let sources = state.config.data.sources.clone();
    let cache = state.cache.clone();
    let loaded = tokio::task::spawn_blocking(move || -> anyhow::Result<Arc<LoadedSeries>> {
        let files = ingest::expand_sources(&sources)?;
        cache.get_or_load(&files)
    })
    .await
    .map_err(|e| anyhow::anyhow!("load task: {}", e))??;
    Ok(loaded)
}

/// GET /version: service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/filters?year=&month=: choices for the next coarser-to-finer filter level.
pub(super) async fn filters_handler(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> Result<Json<impl Serialize>, ApiError> {
    let loaded = load(&state).await?;
    let series = &loaded.series;
    let months = match params.year {
        Some(y) => query::available_months(series, y),
        None => Vec::new(),
    };
    let days = match (params.year, params.month) {
        (Some(y), Some(m)) => query::available_days(series, y, m),
        _ => Vec::new(),
    };
    Ok(Json(FiltersResponse {
        years: query::available_years(series),
        months,
        days,
    }))
}

/// GET /api/query?year=&month=&day=&max_points=: summary, latest row, headline deltas
/// and a downsampled series for the filtered window.
pub(super) async fn query_handler(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> Result<Response, ApiError> {
    let max_points = params
        .max_points
        .unwrap_or(state.config.dashboard.max_points);
    if max_points < MIN_POINTS {
        return Err(ApiError(
            StatusCode::BAD_REQUEST,
            format!("max_points must be at least {MIN_POINTS}, got {max_points}"),
        ));
    }
    let loaded = load(&state).await?;
    let filter = params.filter();
    let result = query::query(&loaded.series, &filter);

    let deltas = HEADLINE_METRICS
        .iter()
        .map(|&m| (m, delta(&result.series, m)))
        .collect();
    let body = QueryResponse {
        count: result.series.len(),
        filter,
        latest: result.series.latest().cloned(),
        points: downsample(&result.series, max_points),
        summary: result.summary,
        deltas,
        report: &loaded.report,
    };
    Ok(Json(body).into_response())
}

/// GET /api/delta/{metric}?year=&month=&day=: change of one metric at the end of the window.
pub(super) async fn delta_handler(
    State(state): State<AppState>,
    Path(metric): Path<String>,
    Query(params): Query<FilterParams>,
) -> Result<Json<Delta>, ApiError> {
    let metric: Metric = metric
        .parse()
        .map_err(|e: UnknownMetric| ApiError(StatusCode::BAD_REQUEST, e.to_string()))?;
    let loaded = load(&state).await?;
    let sub = query::filter_series(&loaded.series, &params.filter());
    Ok(Json(delta(&sub, metric)))
}

/// GET /api/export?year=&month=&day=: filtered window as processed CSV.
pub(super) async fn export_handler(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> Result<impl IntoResponse, ApiError> {
    let loaded = load(&state).await?;
    let sub = query::filter_series(&loaded.series, &params.filter());
    let body = export::to_csv_string(&sub)?;
    Ok(([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], body))
}
