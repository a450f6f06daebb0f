// Index-based downsampling for plotting.
//
// Picks evenly spaced rows; nothing between samples is aggregated, so peaks that
// fall between two picked rows are not represented in the output. Rows are
// copied unchanged, including their interval metrics.

use crate::models::Series;

/// At most `max_points` rows of `series`, always keeping the first and last row.
pub fn downsample(series: &Series, max_points: usize) -> Series {
    let n = series.len();
    if n <= max_points {
        return series.clone();
    }
    let rows = series.snapshots();
    let picked = sample_indices(n, max_points)
        .into_iter()
        .map(|i| rows[i].clone())
        .collect();
    Series::from_sorted(picked, series.extra_columns().to_vec())
}

/// `count` indices spread over `0..=len-1`, rounded to nearest. Requires `count <= len`.
/// With `count >= 2` the first is 0 and the last is `len - 1`.
pub fn sample_indices(len: usize, count: usize) -> Vec<usize> {
    match count {
        0 => Vec::new(),
        1 => vec![0],
        _ => {
            let span = len - 1;
            let steps = count - 1;
            (0..count).map(|i| (i * span + steps / 2) / steps).collect()
        }
    }
}
