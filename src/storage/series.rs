//! Append-only in-memory time series.
//!
//! A `Series` is written by the session thread only and read by any number of
//! aggregate queries. Readers never hold the lock longer than it takes to copy
//! the samples of their window.

use std::sync::{PoisonError, RwLock};

use super::model::{Family, Record, Sample};
use crate::session::SessionError;

/// Samples of one family, ordered by non-decreasing timestamp.
#[derive(Debug)]
pub struct Series {
    family: Family,
    samples: RwLock<Vec<Sample>>,
}

impl Series {
    /// Creates an empty series.
    pub fn new(family: Family) -> Self {
        Self {
            family,
            samples: RwLock::new(Vec::new()),
        }
    }

    /// Family this series holds.
    pub fn family(&self) -> Family {
        self.family
    }

    /// Appends a sample.
    ///
    /// Fails with `OutOfOrder` if `timestamp` is earlier than the last sample.
    pub fn append(&self, timestamp: i64, record: Record) -> Result<(), SessionError> {
        let mut samples = self.samples.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(last) = samples.last()
            && timestamp < last.timestamp
        {
            return Err(SessionError::OutOfOrder {
                family: self.family,
                last: last.timestamp,
                timestamp,
            });
        }
        samples.push(Sample::new(timestamp, record));
        Ok(())
    }

    /// Number of samples appended so far.
    pub fn len(&self) -> usize {
        self.samples.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies every sample with `start <= timestamp <= end`.
    pub fn window(&self, start: i64, end: i64) -> Vec<Sample> {
        if start > end {
            return Vec::new();
        }
        let samples = self.samples.read().unwrap_or_else(PoisonError::into_inner);
        let from = samples.partition_point(|s| s.timestamp < start);
        let to = samples.partition_point(|s| s.timestamp <= end);
        samples[from..to].to_vec()
    }

    /// Timestamps of all samples, in order.
    pub fn timestamps(&self) -> Vec<i64> {
        self.samples
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|s| s.timestamp)
            .collect()
    }
}

/// The four series a session owns, one per family.
#[derive(Debug)]
pub struct SeriesSet {
    series: [Series; 4],
}

impl Default for SeriesSet {
    fn default() -> Self {
        Self::new()
    }
}

impl SeriesSet {
    pub fn new() -> Self {
        Self {
            series: Family::ALL.map(Series::new),
        }
    }

    /// Series of the given family.
    pub fn get(&self, family: Family) -> &Series {
        &self.series[family.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::model::MetricMap;

    fn record(cpu: &str, metric: &str, value: &str) -> Record {
        let mut metrics = MetricMap::new();
        metrics.insert(metric.to_string(), value.to_string());
        let mut record = Record::new();
        record.insert(cpu.to_string(), metrics);
        record
    }

    #[test]
    fn test_append_keeps_order() {
        let series = Series::new(Family::Usage);
        series.append(10, record("all", "%usr", "1")).unwrap();
        series.append(10, record("all", "%usr", "2")).unwrap();
        series.append(12, record("all", "%usr", "3")).unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series.timestamps(), vec![10, 10, 12]);
    }

    #[test]
    fn test_append_rejects_earlier_timestamp() {
        let series = Series::new(Family::Irq);
        series.append(10, Record::new()).unwrap();

        let err = series.append(9, Record::new()).unwrap_err();
        assert!(matches!(
            err,
            SessionError::OutOfOrder {
                family: Family::Irq,
                last: 10,
                timestamp: 9
            }
        ));
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn test_window_is_inclusive() {
        let series = Series::new(Family::Usage);
        for ts in 0..5 {
            series.append(ts, record("all", "%usr", "1")).unwrap();
        }

        let window = series.window(1, 3);
        let ts: Vec<i64> = window.iter().map(|s| s.timestamp).collect();
        assert_eq!(ts, vec![1, 2, 3]);

        assert_eq!(series.window(3, 3).len(), 1);
        assert!(series.window(5, 10).is_empty());
        assert!(series.window(3, 1).is_empty());
    }

    #[test]
    fn test_series_set_routes_by_family() {
        let set = SeriesSet::new();
        set.get(Family::SoftIrq).append(1, Record::new()).unwrap();

        assert_eq!(set.get(Family::SoftIrq).len(), 1);
        assert!(set.get(Family::Usage).is_empty());
        for family in Family::ALL {
            assert_eq!(set.get(family).family(), family);
        }
    }
}
