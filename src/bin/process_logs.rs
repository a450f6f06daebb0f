// Batch processing: load every CSV log, print summary statistics, write the
// derived dataset.
//
// Usage: process-logs [SOURCE...]
//   SOURCE   CSV file or directory; default: data.sources from config.toml,
//            or ./cleaned when no config is present.
// The output path is data.output_path (default: processed_logs.csv).

use std::io::Write;
use std::path::PathBuf;

use clusterstats::config::AppConfig;
use clusterstats::query::{SUMMARY_METRICS, SummaryStats};
use clusterstats::{export, ingest, logging, version};

const DEFAULT_SOURCE: &str = "cleaned";
const DEFAULT_OUTPUT: &str = "processed_logs.csv";

fn main() -> anyhow::Result<()> {
    logging::init();

    let config = match AppConfig::load() {
        Ok(c) => Some(c),
        Err(e) => {
            tracing::debug!(error = %e, "no usable config, using defaults");
            None
        }
    };
    let args: Vec<String> = std::env::args().skip(1).collect();
    let sources: Vec<String> = if !args.is_empty() {
        args
    } else if let Some(c) = &config {
        c.data.sources.clone()
    } else {
        vec![DEFAULT_SOURCE.to_string()]
    };
    let output = PathBuf::from(
        config
            .as_ref()
            .map(|c| c.data.output_path.as_str())
            .unwrap_or(DEFAULT_OUTPUT),
    );

    tracing::info!(sources = ?sources, "{}: processing logs", version::banner());
    let files = ingest::expand_sources(&sources)?;
    if files.is_empty() {
        tracing::warn!(sources = ?sources, "no CSV files found");
        return Ok(());
    }

    let (series, report) = ingest::load_paths(&files)?;
    tracing::info!(
        files = files.len(),
        rows_read = report.rows_read,
        rows_kept = report.rows_kept,
        dropped_rows = report.dropped_rows,
        "logs loaded"
    );

    let summary = SummaryStats::from_series(&series);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "=== Cluster Summary ===")?;
    print_summary(&mut out, &summary)?;

    export::write_csv_file(&series, &output)?;
    tracing::info!(path = %output.display(), rows = series.len(), "processed data saved");
    Ok(())
}

/// One row per statistic, one column per metric.
fn print_summary(out: &mut impl Write, summary: &SummaryStats) -> std::io::Result<()> {
    write!(out, "{:<8}", "")?;
    for m in SUMMARY_METRICS {
        write!(out, " {:>17}", m.name())?;
    }
    writeln!(out)?;

    let rows: [(&str, fn(&clusterstats::query::MetricStats) -> f64); 8] = [
        ("count", |s| s.count as f64),
        ("mean", |s| s.mean),
        ("std", |s| s.std),
        ("min", |s| s.min),
        ("25%", |s| s.p25),
        ("50%", |s| s.median),
        ("75%", |s| s.p75),
        ("max", |s| s.max),
    ];
    for (label, pick) in rows {
        write!(out, "{label:<8}")?;
        for m in SUMMARY_METRICS {
            let v = summary.get(m).map(pick).unwrap_or(0.0);
            write!(out, " {v:>17.4}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}
