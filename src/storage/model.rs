//! Sample and aggregate structures shared by the collector and the analysis code.
//!
//! A `Record` is what one mpstat output block turns into: every CPU line of the
//! block keyed by its CPU id, each carrying the metric columns of the block
//! header. Values stay textual until they are averaged.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical CPU identifier: `"all"` for the aggregate line, otherwise the core index.
pub type CpuId = String;

/// Metric name (`%usr`, `intr/s`, `NET_RX/s`, ...) to its raw textual value.
pub type MetricMap = BTreeMap<String, String>;

/// All CPU lines of one sampling block.
pub type Record = BTreeMap<CpuId, MetricMap>;

/// Windowed mean of every metric, per CPU.
pub type Aggregate = BTreeMap<CpuId, BTreeMap<String, f64>>;

/// CPU id mpstat uses for the all-cores line.
pub const ALL_CPUS: &str = "all";

/// One of the four metric families sampled in parallel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    /// CPU utilization (`mpstat -u`).
    Usage,
    /// Hardware interrupts per CPU (`mpstat -I CPU`).
    Irq,
    /// Software interrupts per CPU (`mpstat -I SCPU`).
    SoftIrq,
    /// Interrupt totals per CPU (`mpstat -I SUM`).
    IrqSum,
}

impl Family {
    /// All families in launch order.
    pub const ALL: [Family; 4] = [Family::Usage, Family::Irq, Family::SoftIrq, Family::IrqSum];

    /// Report flags passed to mpstat after `-P ALL`.
    pub fn mpstat_flags(self) -> &'static [&'static str] {
        match self {
            Family::Usage => &["-u"],
            Family::Irq => &["-I", "CPU"],
            Family::SoftIrq => &["-I", "SCPU"],
            Family::IrqSum => &["-I", "SUM"],
        }
    }

    /// Suffix of the raw output file (`<prefix>_<suffix>.txt`).
    pub fn file_suffix(self) -> &'static str {
        match self {
            Family::Usage => "usage",
            Family::Irq => "irq",
            Family::SoftIrq => "softirq",
            Family::IrqSum => "sum",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Family::Usage => 0,
            Family::Irq => 1,
            Family::SoftIrq => 2,
            Family::IrqSum => 3,
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Family::Usage => "usage",
            Family::Irq => "irq",
            Family::SoftIrq => "soft_irq",
            Family::IrqSum => "irq_sum",
        };
        f.write_str(name)
    }
}

/// A record stamped with the time it was sampled at.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Sample {
    /// Unix timestamp (seconds).
    pub timestamp: i64,
    pub record: Record,
}

impl Sample {
    pub fn new(timestamp: i64, record: Record) -> Self {
        Self { timestamp, record }
    }
}
