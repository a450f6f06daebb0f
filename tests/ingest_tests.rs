// Ingestion tests: column union, timestamp dropping, ordering, schema errors

mod common;

use clusterstats::ingest::{self, IngestError, RawTable, load, load_series};
use common::{HEADER, at, table};

#[test]
fn load_sorts_rows_by_timestamp() {
    let csv = format!(
        "{HEADER}\n\
         2024-01-01 02:00:00,30,1,1,2,0,0,1,1,0,0,0\n\
         2024-01-01 00:00:00,10,1,1,2,0,0,1,1,0,0,0\n\
         2024-01-01 01:00:00,20,1,1,2,0,0,1,1,0,0,0\n"
    );
    let out = load(&[table("a.csv", &csv)]).unwrap();
    let ts: Vec<_> = out.snapshots.iter().map(|s| s.timestamp).collect();
    assert_eq!(
        ts,
        vec![
            at(2024, 1, 1, 0, 0),
            at(2024, 1, 1, 1, 0),
            at(2024, 1, 1, 2, 0)
        ]
    );
    assert!(ts.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn load_merges_sources_and_keeps_input_order_on_ties() {
    let a = format!("{HEADER}\n2024-01-01 00:00:00,11,1,1,2,0,0,1,1,0,0,0\n");
    let b = format!(
        "{HEADER}\n2024-01-01 00:00:00,22,1,1,2,0,0,1,1,0,0,0\n2023-12-31 23:00:00,5,1,1,2,0,0,1,1,0,0,0\n"
    );
    let out = load(&[table("a.csv", &a), table("b.csv", &b)]).unwrap();
    let cpu: Vec<_> = out.snapshots.iter().map(|s| s.cpu_percent).collect();
    assert_eq!(cpu, vec![Some(5.0), Some(11.0), Some(22.0)]);
    assert_eq!(out.report.sources, 2);
    assert_eq!(out.report.rows_kept, 3);
}

#[test]
fn load_drops_unparseable_timestamps_and_counts_them() {
    let csv = format!(
        "{HEADER}\n\
         2024-01-01 00:00:00,10,1,1,2,0,0,1,1,0,0,0\n\
         garbage,20,1,1,2,0,0,1,1,0,0,0\n\
         ,30,1,1,2,0,0,1,1,0,0,0\n"
    );
    let out = load(&[table("a.csv", &csv)]).unwrap();
    assert_eq!(out.snapshots.len(), 1);
    assert_eq!(out.report.rows_read, 3);
    assert_eq!(out.report.dropped_rows, 2);
}

#[test]
fn load_fully_unparseable_source_is_empty_not_error() {
    let csv = format!("{HEADER}\nnope,10,1,1,2,0,0,1,1,0,0,0\n");
    let (series, report) = load_series(&[table("bad.csv", &csv)]).unwrap();
    assert!(series.is_empty());
    assert_eq!(report.dropped_rows, 1);
}

#[test]
fn load_missing_column_in_one_source_is_absent_not_zero() {
    let full = format!("{HEADER}\n2024-01-01 00:00:00,10,4,1,2,0,0,1,1,0,0,0\n");
    let partial = "timestamp,cpu_percent,nodes_total,jobs_running,jobs_queued,jobs_held,jobs_exiting\n\
                   2024-01-01 01:00:00,20,2,1,0,0,0\n";
    let out = load(&[table("full.csv", &full), table("partial.csv", partial)]).unwrap();
    let second = &out.snapshots[1];
    assert_eq!(second.cpu_percent, Some(20.0));
    assert_eq!(second.cpu_used, None);
    assert_eq!(second.nodes_running, None);
    assert_eq!(out.snapshots[0].cpu_used, Some(4.0));
}

#[test]
fn load_schema_error_when_required_column_absent_everywhere() {
    let csv = "timestamp,cpu_percent,jobs_running,jobs_queued,jobs_held,jobs_exiting\n\
               2024-01-01 00:00:00,10,1,0,0,0\n";
    let err = load(&[table("a.csv", csv)]).unwrap_err();
    assert!(matches!(
        err,
        IngestError::Schema {
            column: "nodes_total"
        }
    ));
    assert!(err.to_string().contains("nodes_total"));
}

#[test]
fn load_no_sources_is_empty() {
    let out = load(&[]).unwrap();
    assert!(out.snapshots.is_empty());
    assert_eq!(out.report.sources, 0);
}

#[test]
fn load_keeps_extra_columns_in_first_seen_order() {
    let a = format!("{HEADER},cluster\n2024-01-01 00:00:00,10,1,1,2,0,0,1,1,0,0,0,alpha\n");
    let b = format!("site,{HEADER}\nlab,2024-01-01 01:00:00,10,1,1,2,0,0,1,1,0,0,0\n");
    let out = load(&[table("a.csv", &a), table("b.csv", &b)]).unwrap();
    assert_eq!(out.extra_columns, vec!["cluster", "site"]);
    assert_eq!(
        out.snapshots[0].extra,
        vec![("cluster".to_string(), "alpha".to_string())]
    );
    assert_eq!(
        out.snapshots[1].extra,
        vec![("site".to_string(), "lab".to_string())]
    );
}

#[test]
fn load_counts_invalid_cells_and_node_violations() {
    let csv = format!(
        "{HEADER}\n\
         2024-01-01 00:00:00,abc,1,5,2,0,0,0,1,0,0,0\n\
         2024-01-01 01:00:00,10,1,1,2,0,0,1,-3,0,0,0\n"
    );
    let out = load(&[table("a.csv", &csv)]).unwrap();
    assert_eq!(out.snapshots.len(), 2);
    assert_eq!(out.snapshots[0].cpu_percent, None);
    assert_eq!(out.snapshots[1].jobs_running, None);
    assert_eq!(out.report.invalid_cells, 2);
    assert_eq!(out.report.node_invariant_violations, 1);
}

#[test]
fn load_ignores_previously_derived_columns() {
    let csv = format!(
        "{HEADER},node_utilization,jobs_total\n2024-01-01 00:00:00,10,1,1,2,0,0,1,1,0,0,0,50,1\n"
    );
    let out = load(&[table("processed.csv", &csv)]).unwrap();
    assert!(out.extra_columns.is_empty());
    assert!(out.snapshots[0].extra.is_empty());
}

#[test]
fn ragged_rows_are_accepted() {
    let csv = format!(
        "{HEADER}\n\
         2024-01-01 00:00:00,10,1\n\
         2024-01-01 01:00:00,20,1,1,2,0,0,1,1,0,0,0\n"
    );
    let out = load(&[table("short.csv", &csv)]).unwrap();
    assert_eq!(out.snapshots.len(), 2);
    assert_eq!(out.snapshots[0].cpu_used, Some(1.0));
    assert_eq!(out.snapshots[0].nodes_total, None);
}

#[test]
fn load_schema_error_when_required_column_is_blank_in_every_row() {
    let a = format!(
        "{HEADER}\n\
         2024-01-01 00:00:00,,1,1,2,0,0,1,1,0,0,0\n\
         2024-01-01 01:00:00, ,1,1,2,0,0,1,1,0,0,0\n"
    );
    let b = "timestamp,nodes_total,jobs_running,jobs_queued,jobs_held,jobs_exiting\n\
             2024-01-02 00:00:00,2,1,0,0,0\n";
    let err = load(&[table("a.csv", &a), table("b.csv", b)]).unwrap_err();
    assert!(matches!(
        err,
        IngestError::Schema {
            column: "cpu_percent"
        }
    ));
}

#[test]
fn load_blank_timestamps_are_dropped_not_schema_errors() {
    let csv = format!("{HEADER}\n,10,1,1,2,0,0,1,1,0,0,0\n");
    let out = load(&[table("a.csv", &csv)]).unwrap();
    assert!(out.snapshots.is_empty());
    assert_eq!(out.report.dropped_rows, 1);
}

#[test]
fn load_header_only_source_is_empty_not_error() {
    let out = load(&[table("empty.csv", HEADER)]).unwrap();
    assert!(out.snapshots.is_empty());
    assert_eq!(out.report.rows_read, 0);
}

#[test]
fn load_paths_and_discovery_read_csv_files_from_directory() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("b.csv"),
        format!("{HEADER}\n2024-01-02 00:00:00,20,1,1,2,0,0,1,1,0,0,0\n"),
    )
    .unwrap();
    std::fs::write(
        dir.path().join("a.csv"),
        format!("{HEADER}\n2024-01-01 00:00:00,10,1,1,2,0,0,1,1,0,0,0\n"),
    )
    .unwrap();
    std::fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

    let files = ingest::discover_csv_files(dir.path()).unwrap();
    assert_eq!(files.len(), 2);
    assert!(files[0].ends_with("a.csv"));

    let expanded = ingest::expand_sources(&[dir.path().to_path_buf(), dir.path().join("missing.csv")])
        .unwrap();
    assert_eq!(expanded, files);

    let (series, report) = ingest::load_paths(&files).unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(report.sources, 2);
    assert_eq!(series.snapshots()[1].time_diff_hours, 24.0);
}

#[test]
fn raw_table_from_missing_path_is_io_error() {
    let err = RawTable::from_path(std::path::Path::new("/definitely/not/here.csv")).unwrap_err();
    assert!(matches!(err, IngestError::Io { .. }));
}
