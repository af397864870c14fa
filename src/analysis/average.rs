//! Windowed per-CPU, per-metric means.

use std::collections::BTreeMap;

use tracing::trace;

use super::window::WindowQuery;
use crate::session::SessionError;
use crate::storage::model::{Aggregate, Sample};
use crate::storage::series::Series;

/// Running sum of one metric and the number of samples that carried it.
#[derive(Debug, Default, Clone, Copy)]
struct Accumulator {
    sum: f64,
    count: u32,
}

/// Averages every metric of every CPU over `samples`.
///
/// Each mean only counts the samples that actually carry the CPU and metric;
/// a missing entry is not a zero. Values that are not numbers are skipped.
/// No samples give an empty aggregate.
pub fn average(samples: &[Sample]) -> Aggregate {
    let mut totals: BTreeMap<&str, BTreeMap<&str, Accumulator>> = BTreeMap::new();

    for sample in samples {
        for (cpu, metrics) in &sample.record {
            let cpu_totals = totals.entry(cpu.as_str()).or_default();
            for (name, raw) in metrics {
                match raw.parse::<f64>() {
                    Ok(value) => {
                        let acc = cpu_totals.entry(name.as_str()).or_default();
                        acc.sum += value;
                        acc.count += 1;
                    }
                    Err(_) => {
                        trace!(
                            timestamp = sample.timestamp,
                            cpu = %cpu,
                            metric = %name,
                            value = %raw,
                            "skipping non-numeric value"
                        );
                    }
                }
            }
        }
    }

    totals
        .into_iter()
        .map(|(cpu, metrics)| {
            let means = metrics
                .into_iter()
                .map(|(name, acc)| (name.to_string(), acc.sum / f64::from(acc.count)))
                .collect();
            (cpu.to_string(), means)
        })
        .collect()
}

/// Averages the samples of `series` that fall in the window of `query`.
///
/// `session_start` and `session_end` supply the defaults for bounds the query
/// leaves open (see [`WindowQuery::resolve`]).
pub fn compute_average(
    query: WindowQuery,
    session_start: i64,
    session_end: Option<i64>,
    series: &Series,
) -> Result<Aggregate, SessionError> {
    let window = query.resolve(session_start, session_end)?;
    let samples = series.window(window.start, window.end);
    trace!(
        family = %series.family(),
        start = window.start,
        end = window.end,
        samples = samples.len(),
        "computing average"
    );
    Ok(average(&samples))
}
