// Raw and derived telemetry rows

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One telemetry sample as read from a log. Numeric fields are `None` when the
/// column was missing from the source or the cell was empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub timestamp: NaiveDateTime,
    pub cpu_percent: Option<f64>,
    pub cpu_used: Option<f64>,
    pub nodes_running: Option<u32>,
    pub nodes_total: Option<u32>,
    pub nodes_offline: Option<u32>,
    pub nodes_down: Option<u32>,
    pub nodes_idle: Option<u32>,
    pub jobs_running: Option<u32>,
    pub jobs_queued: Option<u32>,
    pub jobs_held: Option<u32>,
    pub jobs_exiting: Option<u32>,
    /// Values of columns not listed above, as (header, cell).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<(String, String)>,
}

impl TelemetrySnapshot {
    /// Snapshot at `timestamp` with every metric absent.
    pub fn empty(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            cpu_percent: None,
            cpu_used: None,
            nodes_running: None,
            nodes_total: None,
            nodes_offline: None,
            nodes_down: None,
            nodes_idle: None,
            jobs_running: None,
            jobs_queued: None,
            jobs_held: None,
            jobs_exiting: None,
            extra: Vec::new(),
        }
    }

    /// `nodes_running <= nodes_total`; rows missing either count pass.
    pub fn nodes_consistent(&self) -> bool {
        match (self.nodes_running, self.nodes_total) {
            (Some(running), Some(total)) => running <= total,
            _ => true,
        }
    }
}

/// A snapshot plus the metrics computed from it.
///
/// Ratios are NaN when undefined (zero denominator or missing input). The
/// interval fields (`time_diff_hours`, `core_hours`, `wait_time`) depend on the
/// previous row of whichever series this snapshot currently belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedSnapshot {
    #[serde(flatten)]
    pub raw: TelemetrySnapshot,
    pub node_utilization: f64,
    pub cpu_idle_percent: f64,
    pub jobs_total: Option<u32>,
    pub efficiency: f64,
    pub time_diff_hours: f64,
    pub core_hours: f64,
    pub wait_time: f64,
}

impl DerivedSnapshot {
    pub fn timestamp(&self) -> NaiveDateTime {
        self.raw.timestamp
    }
}
