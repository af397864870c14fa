//! Windowed aggregation over collected series.
//!
//! - `window`: resolves optional query bounds into an inclusive window
//! - `average`: per-CPU, per-metric means over the samples of a window

pub mod average;
pub mod window;

pub use average::{average, compute_average};
pub use window::{END_MARGIN_SECS, Window, WindowQuery};
