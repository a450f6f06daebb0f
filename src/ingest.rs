// CSV ingestion: column union across sources, best-effort timestamp parsing,
// drop-and-count for bad rows, stable sort by time.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::derive::derive;
use crate::export::DERIVED_COLUMNS;
use crate::models::{Series, TelemetrySnapshot};

/// Columns that must appear in at least one source header.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "timestamp",
    "cpu_percent",
    "nodes_total",
    "jobs_running",
    "jobs_queued",
    "jobs_held",
    "jobs_exiting",
];

/// Every column the record model understands, in output order.
pub const KNOWN_COLUMNS: [&str; 12] = [
    "timestamp",
    "cpu_percent",
    "cpu_used",
    "nodes_running",
    "nodes_total",
    "nodes_offline",
    "nodes_down",
    "nodes_idle",
    "jobs_running",
    "jobs_queued",
    "jobs_held",
    "jobs_exiting",
];

/// Datetime layouts tried in order after RFC 3339.
const DATETIME_FORMATS: [&str; 8] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("required column `{column}` has no values in any source")]
    Schema { column: &'static str },
    #[error("reading csv {source_name}: {source}")]
    Csv {
        source_name: String,
        #[source]
        source: csv::Error,
    },
    #[error("reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Counters for rows and cells that were skipped instead of failing the load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub sources: usize,
    pub rows_read: usize,
    pub rows_kept: usize,
    /// Rows whose timestamp could not be parsed.
    pub dropped_rows: usize,
    /// Records the CSV reader could not decode at all (e.g. invalid UTF-8).
    pub unreadable_records: usize,
    /// Non-empty numeric cells that did not parse; the value is treated as absent.
    pub invalid_cells: usize,
    /// Rows with `nodes_running > nodes_total` (kept as-is).
    pub node_invariant_violations: usize,
}

/// One source file, read but not yet interpreted.
#[derive(Debug, Clone)]
pub struct RawTable {
    name: String,
    headers: Vec<String>,
    records: Vec<csv::StringRecord>,
    unreadable: usize,
}

impl RawTable {
    /// Reads CSV with a header row. Ragged rows are accepted; undecodable records are skipped.
    pub fn from_reader<R: Read>(name: impl Into<String>, reader: R) -> Result<Self, IngestError> {
        let name = name.into();
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = rdr
            .headers()
            .map_err(|source| IngestError::Csv {
                source_name: name.clone(),
                source,
            })?
            .iter()
            .map(str::to_string)
            .collect();

        let mut records = Vec::new();
        let mut unreadable = 0;
        for result in rdr.records() {
            match result {
                Ok(record) => records.push(record),
                Err(e) => {
                    debug!(source = %name, error = %e, "skipping unreadable record");
                    unreadable += 1;
                }
            }
        }
        Ok(Self {
            name,
            headers,
            records,
            unreadable,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, IngestError> {
        let file = File::open(path).map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(path.display().to_string(), file)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn row_count(&self) -> usize {
        self.records.len()
    }

    fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    fn has_value_in(&self, column: &str) -> bool {
        self.column_index(column).is_some_and(|i| {
            self.records
                .iter()
                .any(|r| r.get(i).is_some_and(|cell| !cell.trim().is_empty()))
        })
    }
}

/// Sorted snapshots plus what was needed to get them there.
#[derive(Debug, Clone)]
pub struct Ingested {
    pub snapshots: Vec<TelemetrySnapshot>,
    pub extra_columns: Vec<String>,
    pub report: IngestReport,
}

/// Header positions of the known columns within one table.
struct ColumnMap {
    known: [Option<usize>; 12],
    extra: Vec<(usize, String)>,
}

impl ColumnMap {
    fn new(table: &RawTable) -> Self {
        let known = KNOWN_COLUMNS.map(|c| table.column_index(c));
        let extra = table
            .headers
            .iter()
            .enumerate()
            .filter(|(_, h)| is_extra_column(h))
            .map(|(i, h)| (i, h.clone()))
            .collect();
        Self { known, extra }
    }

    fn cell<'r>(&self, record: &'r csv::StringRecord, column: usize) -> Option<&'r str> {
        self.known[column].and_then(|i| record.get(i))
    }
}

/// Columns carried through untouched. Derived columns from a previously
/// exported file are not extras; they are recomputed.
fn is_extra_column(header: &str) -> bool {
    !header.is_empty() && !KNOWN_COLUMNS.contains(&header) && !DERIVED_COLUMNS.contains(&header)
}

/// Concatenates, parses and sorts all sources.
///
/// Fails when a required column is absent from every source header, or when
/// rows were read but none has a value in a required column other than
/// `timestamp`. An empty `sources` slice yields an empty result.
#[instrument(skip(sources), fields(operation = "load", sources = sources.len()))]
pub fn load(sources: &[RawTable]) -> Result<Ingested, IngestError> {
    let mut report = IngestReport {
        sources: sources.len(),
        ..Default::default()
    };
    if sources.is_empty() {
        return Ok(Ingested {
            snapshots: Vec::new(),
            extra_columns: Vec::new(),
            report,
        });
    }
    for column in REQUIRED_COLUMNS {
        if !sources.iter().any(|t| t.column_index(column).is_some()) {
            return Err(IngestError::Schema { column });
        }
    }
    // Bad timestamps are dropped per row; the other required columns need at
    // least one filled cell once any row was read.
    if sources.iter().any(|t| t.row_count() > 0) {
        for column in REQUIRED_COLUMNS.into_iter().skip(1) {
            if !sources.iter().any(|t| t.has_value_in(column)) {
                return Err(IngestError::Schema { column });
            }
        }
    }

    let mut extra_columns: Vec<String> = Vec::new();
    let mut snapshots = Vec::new();

    for table in sources {
        let map = ColumnMap::new(table);
        for (_, name) in &map.extra {
            if !extra_columns.contains(name) {
                extra_columns.push(name.clone());
            }
        }
        report.unreadable_records += table.unreadable;

        let kept_before = snapshots.len();
        for record in &table.records {
            report.rows_read += 1;
            let Some(snapshot) = parse_record(&map, record, &mut report) else {
                report.dropped_rows += 1;
                continue;
            };
            if !snapshot.nodes_consistent() {
                report.node_invariant_violations += 1;
            }
            snapshots.push(snapshot);
        }
        if snapshots.len() == kept_before && table.row_count() > 0 {
            warn!(source = %table.name, rows = table.row_count(), "no parseable rows in source");
        }
    }

    // sort_by_key is stable: equal timestamps keep source then row order
    snapshots.sort_by_key(|s| s.timestamp);
    report.rows_kept = snapshots.len();

    if report.dropped_rows > 0 {
        warn!(
            dropped_rows = report.dropped_rows,
            "dropped rows with unparseable timestamps"
        );
    }
    if report.invalid_cells > 0 {
        warn!(
            invalid_cells = report.invalid_cells,
            "ignored unparseable numeric cells"
        );
    }
    if report.node_invariant_violations > 0 {
        warn!(
            rows = report.node_invariant_violations,
            "nodes_running exceeds nodes_total"
        );
    }
    debug!(rows_kept = report.rows_kept, "load complete");

    Ok(Ingested {
        snapshots,
        extra_columns,
        report,
    })
}

/// `load` followed by `derive`.
pub fn load_series(sources: &[RawTable]) -> Result<(Series, IngestReport), IngestError> {
    let ingested = load(sources)?;
    let series = derive(ingested.snapshots, ingested.extra_columns);
    Ok((series, ingested.report))
}

/// Reads every file and loads them as one series.
#[instrument(skip(paths), fields(operation = "load_paths", files = paths.len()))]
pub fn load_paths<P: AsRef<Path>>(paths: &[P]) -> Result<(Series, IngestReport), IngestError> {
    let tables = paths
        .iter()
        .map(|p| RawTable::from_path(p.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    let (series, report) = load_series(&tables)?;
    info!(
        files = tables.len(),
        rows = series.len(),
        dropped = report.dropped_rows,
        "loaded telemetry"
    );
    Ok((series, report))
}

/// `*.csv` files directly inside `dir`, sorted by file name.
pub fn discover_csv_files(dir: &Path) -> Result<Vec<PathBuf>, IngestError> {
    let io_err = |source| IngestError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        if is_csv && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Resolves configured sources: directories expand to their CSV files, files
/// are kept, missing paths are skipped with a warning.
pub fn expand_sources<P: AsRef<Path>>(sources: &[P]) -> Result<Vec<PathBuf>, IngestError> {
    let mut out = Vec::new();
    for source in sources {
        let path = source.as_ref();
        if path.is_dir() {
            out.extend(discover_csv_files(path)?);
        } else if path.is_file() {
            out.push(path.to_path_buf());
        } else {
            warn!(path = %path.display(), "source not found, skipping");
        }
    }
    Ok(out)
}

/// Best-effort parse of a timezone-naive instant. Offsets in RFC 3339 input are
/// dropped and the wall-clock time kept.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_record(
    map: &ColumnMap,
    record: &csv::StringRecord,
    report: &mut IngestReport,
) -> Option<TelemetrySnapshot> {
    let timestamp = map.cell(record, 0).and_then(parse_timestamp)?;
    let mut invalid = 0;
    let mut real = |i: usize| parse_real(map.cell(record, i), &mut invalid);
    let cpu_percent = real(1);
    let cpu_used = real(2);
    let mut count = |i: usize| parse_count(map.cell(record, i), &mut invalid);
    let snapshot = TelemetrySnapshot {
        timestamp,
        cpu_percent,
        cpu_used,
        nodes_running: count(3),
        nodes_total: count(4),
        nodes_offline: count(5),
        nodes_down: count(6),
        nodes_idle: count(7),
        jobs_running: count(8),
        jobs_queued: count(9),
        jobs_held: count(10),
        jobs_exiting: count(11),
        extra: map
            .extra
            .iter()
            .map(|(i, name)| (name.clone(), record.get(*i).unwrap_or_default().to_string()))
            .collect(),
    };
    report.invalid_cells += invalid;
    Some(snapshot)
}

fn parse_real(cell: Option<&str>, invalid: &mut usize) -> Option<f64> {
    let s = cell?.trim();
    if s.is_empty() {
        return None;
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_nan() => None,
        Ok(v) => Some(v),
        Err(_) => {
            *invalid += 1;
            None
        }
    }
}

/// Accepts integral floats ("8.0") as written by tools that store counts as reals.
fn parse_count(cell: Option<&str>, invalid: &mut usize) -> Option<u32> {
    let s = cell?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(n) = s.parse::<u32>() {
        return Some(n);
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_nan() => None,
        Ok(v) if v.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&v) => Some(v as u32),
        _ => {
            *invalid += 1;
            None
        }
    }
}
