// Series -> CSV in the processed-log layout: raw columns, pass-through columns,
// then derived columns. Output reloads through `ingest::load`.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::ingest::KNOWN_COLUMNS;
use crate::models::{DerivedSnapshot, Series};

pub const DERIVED_COLUMNS: [&str; 7] = [
    "node_utilization",
    "cpu_idle_percent",
    "jobs_total",
    "efficiency",
    "time_diff_hours",
    "core_hours",
    "wait_time",
];

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn write_csv<W: Write>(series: &Series, writer: W) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let header: Vec<&str> = KNOWN_COLUMNS
        .iter()
        .copied()
        .chain(series.extra_columns().iter().map(String::as_str))
        .chain(DERIVED_COLUMNS)
        .collect();
    wtr.write_record(&header)?;

    for row in series {
        wtr.write_record(row_fields(row, series.extra_columns()))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_csv_file(series: &Series, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    write_csv(series, file)
}

/// CSV text for a series (HTTP export).
pub fn to_csv_string(series: &Series) -> anyhow::Result<String> {
    let mut buf = Vec::new();
    write_csv(series, &mut buf)?;
    Ok(String::from_utf8(buf)?)
}

fn row_fields(row: &DerivedSnapshot, extra_columns: &[String]) -> Vec<String> {
    let raw = &row.raw;
    let mut out =
        Vec::with_capacity(KNOWN_COLUMNS.len() + extra_columns.len() + DERIVED_COLUMNS.len());
    out.push(raw.timestamp.format(TIMESTAMP_FORMAT).to_string());
    out.push(real(raw.cpu_percent.unwrap_or(f64::NAN)));
    out.push(real(raw.cpu_used.unwrap_or(f64::NAN)));
    for n in [
        raw.nodes_running,
        raw.nodes_total,
        raw.nodes_offline,
        raw.nodes_down,
        raw.nodes_idle,
        raw.jobs_running,
        raw.jobs_queued,
        raw.jobs_held,
        raw.jobs_exiting,
    ] {
        out.push(count(n));
    }
    for column in extra_columns {
        let value = raw
            .extra
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v.clone())
            .unwrap_or_default();
        out.push(value);
    }
    out.push(real(row.node_utilization));
    out.push(real(row.cpu_idle_percent));
    out.push(count(row.jobs_total));
    out.push(real(row.efficiency));
    out.push(real(row.time_diff_hours));
    out.push(real(row.core_hours));
    out.push(real(row.wait_time));
    out
}

// NaN is written as an empty cell
fn real(v: f64) -> String {
    if v.is_nan() { String::new() } else { v.to_string() }
}

fn count(v: Option<u32>) -> String {
    v.map(|n| n.to_string()).unwrap_or_default()
}
