// Loaded-series cache for the serving layer: keyed by the source file list,
// invalidated when any file's mtime changes or the entry is older than the TTL.
// Expired entries are evicted whenever a new load is stored.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime};

use tracing::{debug, instrument};

use crate::ingest::{self, IngestReport};
use crate::models::Series;

/// A series with the report and file list it was loaded from.
#[derive(Debug)]
pub struct LoadedSeries {
    pub series: Series,
    pub report: IngestReport,
    pub files: Vec<PathBuf>,
}

struct CacheEntry {
    mtimes: Vec<Option<SystemTime>>,
    loaded_at: Instant,
    value: Arc<LoadedSeries>,
}

pub struct SeriesCache {
    ttl: Duration,
    entries: Mutex<HashMap<Vec<PathBuf>, CacheEntry>>,
}

impl SeriesCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached series for `files` or loads it. Loading happens without
    /// holding the lock; concurrent misses may both load, last insert wins.
    #[instrument(skip(self, files), fields(operation = "get_or_load", files = files.len()))]
    pub fn get_or_load(&self, files: &[PathBuf]) -> anyhow::Result<Arc<LoadedSeries>> {
        let mtimes = modification_times(files);
        {
            let entries = self
                .entries
                .lock()
                .map_err(|e| anyhow::anyhow!("series cache lock poisoned: {}", e))?;
            if let Some(entry) = entries.get(files)
                && entry.mtimes == mtimes
                && entry.loaded_at.elapsed() < self.ttl
            {
                debug!("series cache hit");
                return Ok(entry.value.clone());
            }
        }

        debug!("series cache miss");
        let (series, report) = ingest::load_paths(files)?;
        let value = Arc::new(LoadedSeries {
            series,
            report,
            files: files.to_vec(),
        });
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| anyhow::anyhow!("series cache lock poisoned: {}", e))?;
        // drop expired entries, including file lists no longer requested
        entries.retain(|_, entry| entry.loaded_at.elapsed() < self.ttl);
        entries.insert(
            files.to_vec(),
            CacheEntry {
                mtimes,
                loaded_at: Instant::now(),
                value: value.clone(),
            },
        );
        Ok(value)
    }

    /// Drops every entry.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn modification_times(files: &[PathBuf]) -> Vec<Option<SystemTime>> {
    files
        .iter()
        .map(|p| std::fs::metadata(p).and_then(|m| m.modified()).ok())
        .collect()
}
