pub mod model;
pub mod series;

pub use model::{Aggregate, CpuId, Family, MetricMap, Record, Sample};
pub use series::{Series, SeriesSet};
