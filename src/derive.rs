// Derived metrics: per-row ratios and totals, then the order-dependent interval pass.
// Pure functions; no state is kept between calls.

use chrono::NaiveDateTime;

use crate::models::{DerivedSnapshot, Series, TelemetrySnapshot};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Builds a series from snapshots in any order. Rows are stably sorted by
/// timestamp first, so equal timestamps keep their input order.
pub fn derive(mut snapshots: Vec<TelemetrySnapshot>, extra_columns: Vec<String>) -> Series {
    snapshots.sort_by_key(|s| s.timestamp);
    let mut rows: Vec<DerivedSnapshot> = snapshots.into_iter().map(derive_row).collect();
    recompute_intervals(&mut rows);
    Series::from_sorted(rows, extra_columns)
}

/// Row-local metrics. Interval fields start at 0 and are filled by `recompute_intervals`.
pub fn derive_row(raw: TelemetrySnapshot) -> DerivedSnapshot {
    let node_utilization = node_utilization(raw.nodes_running, raw.nodes_total);
    let cpu_percent = raw.cpu_percent.unwrap_or(f64::NAN);
    let jobs_total = jobs_total(&raw);

    DerivedSnapshot {
        node_utilization,
        cpu_idle_percent: 100.0 - cpu_percent,
        jobs_total,
        efficiency: cpu_percent * node_utilization / 100.0,
        time_diff_hours: 0.0,
        core_hours: 0.0,
        wait_time: 0.0,
        raw,
    }
}

/// Sets `time_diff_hours`, `core_hours` and `wait_time` relative to the previous
/// row of `rows`. The first row is the baseline (diff 0), so a filtered slice
/// restarts from its own first row.
pub fn recompute_intervals(rows: &mut [DerivedSnapshot]) {
    let mut prev: Option<NaiveDateTime> = None;
    for row in rows.iter_mut() {
        let ts = row.timestamp();
        let diff_hours = match prev {
            Some(p) => (ts - p).num_milliseconds() as f64 / 1000.0 / SECONDS_PER_HOUR,
            None => 0.0,
        };
        row.time_diff_hours = diff_hours;
        row.core_hours = row.raw.cpu_used.unwrap_or(f64::NAN) * diff_hours;
        row.wait_time = row.raw.jobs_queued.map_or(f64::NAN, f64::from) * diff_hours;
        prev = Some(ts);
    }
}

/// Percentage of nodes running; NaN when the total is zero or either count is missing.
pub fn node_utilization(running: Option<u32>, total: Option<u32>) -> f64 {
    match (running, total) {
        (Some(_), Some(0)) => f64::NAN,
        (Some(r), Some(t)) => f64::from(r) / f64::from(t) * 100.0,
        _ => f64::NAN,
    }
}

fn jobs_total(raw: &TelemetrySnapshot) -> Option<u32> {
    let parts = [
        raw.jobs_running?,
        raw.jobs_queued?,
        raw.jobs_held?,
        raw.jobs_exiting?,
    ];
    parts.iter().try_fold(0u32, |acc, &n| acc.checked_add(n))
}
