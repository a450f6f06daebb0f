// Numeric fields addressable by name (delta, summary stats, API paths)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::DerivedSnapshot;

/// Every numeric column of a derived row; serializes to its column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    CpuPercent,
    CpuUsed,
    NodesRunning,
    NodesTotal,
    NodesOffline,
    NodesDown,
    NodesIdle,
    JobsRunning,
    JobsQueued,
    JobsHeld,
    JobsExiting,
    NodeUtilization,
    CpuIdlePercent,
    JobsTotal,
    Efficiency,
    TimeDiffHours,
    CoreHours,
    WaitTime,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown metric: {0}")]
pub struct UnknownMetric(pub String);

impl Metric {
    pub const ALL: [Metric; 18] = [
        Metric::CpuPercent,
        Metric::CpuUsed,
        Metric::NodesRunning,
        Metric::NodesTotal,
        Metric::NodesOffline,
        Metric::NodesDown,
        Metric::NodesIdle,
        Metric::JobsRunning,
        Metric::JobsQueued,
        Metric::JobsHeld,
        Metric::JobsExiting,
        Metric::NodeUtilization,
        Metric::CpuIdlePercent,
        Metric::JobsTotal,
        Metric::Efficiency,
        Metric::TimeDiffHours,
        Metric::CoreHours,
        Metric::WaitTime,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Metric::CpuPercent => "cpu_percent",
            Metric::CpuUsed => "cpu_used",
            Metric::NodesRunning => "nodes_running",
            Metric::NodesTotal => "nodes_total",
            Metric::NodesOffline => "nodes_offline",
            Metric::NodesDown => "nodes_down",
            Metric::NodesIdle => "nodes_idle",
            Metric::JobsRunning => "jobs_running",
            Metric::JobsQueued => "jobs_queued",
            Metric::JobsHeld => "jobs_held",
            Metric::JobsExiting => "jobs_exiting",
            Metric::NodeUtilization => "node_utilization",
            Metric::CpuIdlePercent => "cpu_idle_percent",
            Metric::JobsTotal => "jobs_total",
            Metric::Efficiency => "efficiency",
            Metric::TimeDiffHours => "time_diff_hours",
            Metric::CoreHours => "core_hours",
            Metric::WaitTime => "wait_time",
        }
    }

    /// Value of this metric in `row`; absent inputs read as NaN.
    pub fn value(self, row: &DerivedSnapshot) -> f64 {
        let raw = &row.raw;
        let count = |v: Option<u32>| v.map_or(f64::NAN, f64::from);
        match self {
            Metric::CpuPercent => raw.cpu_percent.unwrap_or(f64::NAN),
            Metric::CpuUsed => raw.cpu_used.unwrap_or(f64::NAN),
            Metric::NodesRunning => count(raw.nodes_running),
            Metric::NodesTotal => count(raw.nodes_total),
            Metric::NodesOffline => count(raw.nodes_offline),
            Metric::NodesDown => count(raw.nodes_down),
            Metric::NodesIdle => count(raw.nodes_idle),
            Metric::JobsRunning => count(raw.jobs_running),
            Metric::JobsQueued => count(raw.jobs_queued),
            Metric::JobsHeld => count(raw.jobs_held),
            Metric::JobsExiting => count(raw.jobs_exiting),
            Metric::NodeUtilization => row.node_utilization,
            Metric::CpuIdlePercent => row.cpu_idle_percent,
            Metric::JobsTotal => count(row.jobs_total),
            Metric::Efficiency => row.efficiency,
            Metric::TimeDiffHours => row.time_diff_hours,
            Metric::CoreHours => row.core_hours,
            Metric::WaitTime => row.wait_time,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Metric::ALL
            .into_iter()
            .find(|m| m.name() == wanted)
            .ok_or_else(|| UnknownMetric(s.to_string()))
    }
}
