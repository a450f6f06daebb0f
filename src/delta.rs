// Latest value of a metric and its change against the previous snapshot.

use serde::Serialize;

use crate::models::{Metric, Series};

/// `percent_change` is pre-formatted with sign and one decimal, e.g. "+60.0%".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Delta {
    pub current: f64,
    pub delta: f64,
    pub percent_change: String,
}

impl Delta {
    fn zero(current: f64) -> Self {
        Self {
            current,
            delta: 0.0,
            percent_change: ZERO_PERCENT.to_string(),
        }
    }
}

const ZERO_PERCENT: &str = "0%";

/// Last row against second-to-last row.
///
/// Empty series gives `(0, 0, "0%")`, a single row gives `(value, 0, "0%")`.
/// When the previous value is 0 (or missing) the change is reported as "0%"
/// even if the current value is not 0; a rise from nothing is not expressible
/// as a percentage and is shown as no change. A missing current value is also
/// "0%", while `current` and `delta` stay NaN.
pub fn delta(series: &Series, metric: Metric) -> Delta {
    let rows = series.snapshots();
    match rows {
        [] => Delta::zero(0.0),
        [only] => Delta::zero(metric.value(only)),
        [.., prev, last] => {
            let current = metric.value(last);
            let previous = metric.value(prev);
            let delta = current - previous;
            let percent_change = if previous == 0.0 || previous.is_nan() || current.is_nan() {
                ZERO_PERCENT.to_string()
            } else {
                format!("{:+.1}%", delta / previous * 100.0)
            };
            Delta {
                current,
                delta,
                percent_change,
            }
        }
    }
}
