// Domain models: telemetry rows, derived rows, series

mod metric;
mod series;
mod snapshot;

pub use metric::{Metric, UnknownMetric};
pub use series::Series;
pub use snapshot::{DerivedSnapshot, TelemetrySnapshot};
