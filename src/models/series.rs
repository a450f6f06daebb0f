// Time-ordered, read-only collection of derived snapshots

use serde::Serialize;

use super::{DerivedSnapshot, Metric};

/// Snapshots sorted by timestamp (non-decreasing). Built by `derive` and never
/// mutated afterwards; filtering and downsampling return new series.
/// Serializes as the bare list of rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Series {
    snapshots: Vec<DerivedSnapshot>,
    /// Pass-through column headers in first-seen order, for CSV export.
    #[serde(skip)]
    extra_columns: Vec<String>,
}

impl Series {
    /// Callers must supply rows already in timestamp order.
    pub(crate) fn from_sorted(snapshots: Vec<DerivedSnapshot>, extra_columns: Vec<String>) -> Self {
        debug_assert!(
            snapshots
                .windows(2)
                .all(|w| w[0].timestamp() <= w[1].timestamp())
        );
        Self {
            snapshots,
            extra_columns,
        }
    }

    pub fn snapshots(&self) -> &[DerivedSnapshot] {
        &self.snapshots
    }

    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DerivedSnapshot> {
        self.snapshots.iter()
    }

    pub fn first(&self) -> Option<&DerivedSnapshot> {
        self.snapshots.first()
    }

    /// Most recent snapshot, if any.
    pub fn latest(&self) -> Option<&DerivedSnapshot> {
        self.snapshots.last()
    }

    /// Column of one metric, in series order.
    pub fn values(&self, metric: Metric) -> Vec<f64> {
        self.snapshots.iter().map(|s| metric.value(s)).collect()
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a DerivedSnapshot;
    type IntoIter = std::slice::Iter<'a, DerivedSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.snapshots.iter()
    }
}
