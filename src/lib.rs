//! cpuutil - per-CPU utilization and interrupt sampling with windowed averages.
//!
//! Provides:
//! - `collector`: mpstat launching, output parsing, mock samplers
//! - `storage`: samples, records, and append-only series
//! - `session`: the background sampling session and its lifecycle
//! - `analysis`: windowed per-CPU, per-metric averages
//! - `util`: time parsing helpers

pub mod analysis;
pub mod collector;
pub mod session;
pub mod storage;
pub mod util;

pub use analysis::WindowQuery;
pub use session::{Session, SessionConfig, SessionError, SessionState};
pub use storage::{Aggregate, Family};
