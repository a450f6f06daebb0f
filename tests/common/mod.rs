// Shared test helpers
#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use clusterstats::derive::derive;
use clusterstats::ingest::RawTable;
use clusterstats::models::{Series, TelemetrySnapshot};

pub const HEADER: &str = "timestamp,cpu_percent,cpu_used,nodes_running,nodes_total,nodes_offline,nodes_down,nodes_idle,jobs_running,jobs_queued,jobs_held,jobs_exiting";

pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

/// Fully populated snapshot; node and job counts not given are 0.
pub fn snapshot(
    timestamp: NaiveDateTime,
    cpu_percent: f64,
    nodes_running: u32,
    nodes_total: u32,
    cpu_used: f64,
    jobs: [u32; 4],
) -> TelemetrySnapshot {
    TelemetrySnapshot {
        timestamp,
        cpu_percent: Some(cpu_percent),
        cpu_used: Some(cpu_used),
        nodes_running: Some(nodes_running),
        nodes_total: Some(nodes_total),
        nodes_offline: Some(0),
        nodes_down: Some(0),
        nodes_idle: Some(nodes_total.saturating_sub(nodes_running)),
        jobs_running: Some(jobs[0]),
        jobs_queued: Some(jobs[1]),
        jobs_held: Some(jobs[2]),
        jobs_exiting: Some(jobs[3]),
        extra: vec![],
    }
}

/// Snapshot carrying only a timestamp and a cpu reading.
pub fn cpu_snapshot(timestamp: NaiveDateTime, cpu_percent: f64) -> TelemetrySnapshot {
    snapshot(timestamp, cpu_percent, 1, 1, 1.0, [0, 0, 0, 0])
}

pub fn series(rows: Vec<TelemetrySnapshot>) -> Series {
    derive(rows, vec![])
}

/// The two-row scenario: 50% -> 80% cpu one hour apart.
pub fn two_hour_series() -> Series {
    series(vec![
        snapshot(at(2024, 1, 1, 0, 0), 50.0, 8, 10, 4.0, [3, 2, 0, 0]),
        snapshot(at(2024, 1, 1, 1, 0), 80.0, 9, 10, 7.0, [4, 1, 0, 0]),
    ])
}

pub fn table(name: &str, csv: &str) -> RawTable {
    RawTable::from_reader(name, csv.as_bytes()).unwrap()
}
