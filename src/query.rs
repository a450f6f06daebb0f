// Calendar filtering (year / month / day-of-month) and descriptive statistics
// over the filtered series.

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::derive::recompute_intervals;
use crate::models::{DerivedSnapshot, Metric, Series};

/// Metrics reported in `SummaryStats`, in output order.
pub const SUMMARY_METRICS: [Metric; 9] = [
    Metric::CpuPercent,
    Metric::CpuUsed,
    Metric::NodeUtilization,
    Metric::Efficiency,
    Metric::JobsRunning,
    Metric::JobsQueued,
    Metric::JobsHeld,
    Metric::JobsExiting,
    Metric::JobsTotal,
];

/// Calendar filter. Each field is applied only when set; no field requires another.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeFilter {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl TimeFilter {
    pub fn matches(&self, row: &DerivedSnapshot) -> bool {
        let ts = row.timestamp();
        self.year.is_none_or(|y| ts.year() == y)
            && self.month.is_none_or(|m| ts.month() == m)
            && self.day.is_none_or(|d| ts.day() == d)
    }
}

/// Descriptive statistics for one metric. Quartiles are linearly interpolated;
/// `std` is the sample standard deviation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricStats {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub max: f64,
}

impl MetricStats {
    /// Stats over the non-NaN values. No values gives all zeros; one value gives `std` 0.
    pub fn from_values(values: &[f64]) -> Self {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        if sorted.is_empty() {
            return Self::zero();
        }
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        let std = if count < 2 {
            0.0
        } else {
            let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (count - 1) as f64).sqrt()
        };

        Self {
            count,
            mean,
            std,
            min: sorted[0],
            p25: quantile_sorted(&sorted, 0.25),
            median: quantile_sorted(&sorted, 0.5),
            p75: quantile_sorted(&sorted, 0.75),
            max: sorted[count - 1],
        }
    }

    fn zero() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            std: 0.0,
            min: 0.0,
            p25: 0.0,
            median: 0.0,
            p75: 0.0,
            max: 0.0,
        }
    }
}

/// Linear interpolation between closest ranks. `sorted` must be non-empty and ascending.
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Row count plus per-metric statistics for one series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub rows: usize,
    pub metrics: BTreeMap<Metric, MetricStats>,
}

impl SummaryStats {
    pub fn from_series(series: &Series) -> Self {
        let metrics = SUMMARY_METRICS
            .iter()
            .map(|&m| (m, MetricStats::from_values(&series.values(m))))
            .collect();
        Self {
            rows: series.len(),
            metrics,
        }
    }

    pub fn get(&self, metric: Metric) -> Option<&MetricStats> {
        self.metrics.get(&metric)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub series: Series,
    pub summary: SummaryStats,
}

/// Rows of `series` matching `filter`, with interval metrics recomputed from the
/// first matching row. The input series is not modified.
pub fn query(series: &Series, filter: &TimeFilter) -> QueryResult {
    let sub = filter_series(series, filter);
    let summary = SummaryStats::from_series(&sub);
    QueryResult {
        series: sub,
        summary,
    }
}

/// Filtering step of `query` without the statistics.
pub fn filter_series(series: &Series, filter: &TimeFilter) -> Series {
    let mut rows: Vec<DerivedSnapshot> = series
        .iter()
        .filter(|r| filter.matches(r))
        .cloned()
        .collect();
    recompute_intervals(&mut rows);
    Series::from_sorted(rows, series.extra_columns().to_vec())
}

/// Distinct years present, ascending.
pub fn available_years(series: &Series) -> Vec<i32> {
    distinct(series.iter().map(|r| r.timestamp().year()))
}

/// Distinct months present within `year`, ascending.
pub fn available_months(series: &Series, year: i32) -> Vec<u32> {
    distinct(
        series
            .iter()
            .map(|r| r.timestamp())
            .filter(|ts| ts.year() == year)
            .map(|ts| ts.month()),
    )
}

/// Distinct days of month present within `year`/`month`, ascending.
pub fn available_days(series: &Series, year: i32, month: u32) -> Vec<u32> {
    distinct(
        series
            .iter()
            .map(|r| r.timestamp())
            .filter(|ts| ts.year() == year && ts.month() == month)
            .map(|ts| ts.day()),
    )
}

fn distinct<T: Ord>(values: impl Iterator<Item = T>) -> Vec<T> {
    let mut out: Vec<T> = values.collect();
    out.sort();
    out.dedup();
    out
}
