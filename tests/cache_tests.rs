// SeriesCache: hit on unchanged files, reload on mtime change or TTL expiry

mod common;

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use clusterstats::cache::SeriesCache;
use common::HEADER;

fn write_log(path: &std::path::Path, rows: &[&str]) {
    let mut body = format!("{HEADER}\n");
    for r in rows {
        body.push_str(r);
        body.push('\n');
    }
    std::fs::write(path, body).unwrap();
}

#[test]
fn cache_returns_same_series_while_files_unchanged() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("a.csv");
    write_log(&path, &["2024-01-01 00:00:00,10,1,1,2,0,0,1,1,0,0,0"]);
    let files = vec![path];

    let cache = SeriesCache::new(Duration::from_secs(60));
    let first = cache.get_or_load(&files).unwrap();
    let second = cache.get_or_load(&files).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.series.len(), 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn cache_reloads_when_mtime_changes() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("a.csv");
    write_log(&path, &["2024-01-01 00:00:00,10,1,1,2,0,0,1,1,0,0,0"]);
    let files = vec![path.clone()];

    let cache = SeriesCache::new(Duration::from_secs(60));
    let first = cache.get_or_load(&files).unwrap();

    write_log(
        &path,
        &[
            "2024-01-01 00:00:00,10,1,1,2,0,0,1,1,0,0,0",
            "2024-01-01 01:00:00,20,1,1,2,0,0,1,1,0,0,0",
        ],
    );
    let file = std::fs::File::options().write(true).open(&path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(10))
        .unwrap();

    let second = cache.get_or_load(&files).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(second.series.len(), 2);
}

#[test]
fn cache_reloads_after_ttl() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("a.csv");
    write_log(&path, &["2024-01-01 00:00:00,10,1,1,2,0,0,1,1,0,0,0"]);
    let files = vec![path];

    let cache = SeriesCache::new(Duration::ZERO);
    let first = cache.get_or_load(&files).unwrap();
    let second = cache.get_or_load(&files).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(first.series, second.series);
}

#[test]
fn cache_propagates_schema_errors_and_clear_empties() {
    let dir = tempfile::TempDir::new().unwrap();
    let bad = dir.path().join("bad.csv");
    std::fs::write(&bad, "timestamp,foo\n2024-01-01 00:00:00,1\n").unwrap();

    let cache = SeriesCache::new(Duration::from_secs(60));
    let err = cache.get_or_load(&[bad]).unwrap_err();
    assert!(err.to_string().contains("cpu_percent"));
    assert!(cache.is_empty());

    let good = dir.path().join("good.csv");
    write_log(&good, &["2024-01-01 00:00:00,10,1,1,2,0,0,1,1,0,0,0"]);
    cache.get_or_load(&[good]).unwrap();
    assert_eq!(cache.len(), 1);
    cache.clear();
    assert!(cache.is_empty());
}

#[test]
fn cache_evicts_expired_file_lists_on_insert() {
    let dir = tempfile::TempDir::new().unwrap();
    let a = dir.path().join("a.csv");
    let b = dir.path().join("b.csv");
    write_log(&a, &["2024-01-01 00:00:00,10,1,1,2,0,0,1,1,0,0,0"]);
    write_log(&b, &["2024-01-02 00:00:00,20,1,1,2,0,0,1,1,0,0,0"]);

    let cache = SeriesCache::new(Duration::from_millis(200));
    cache.get_or_load(std::slice::from_ref(&a)).unwrap();
    cache.get_or_load(&[a.clone(), b.clone()]).unwrap();
    assert_eq!(cache.len(), 2);

    std::thread::sleep(Duration::from_millis(300));
    let loaded = cache.get_or_load(&[a, b]).unwrap();
    assert_eq!(loaded.series.len(), 2);
    assert_eq!(cache.len(), 1);
}
