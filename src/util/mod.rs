//! Utility modules for cpuutil.

mod time_parser;

pub use time_parser::{TimeParseError, parse_duration_secs, parse_time, parse_time_with_base};

/// Current Unix timestamp in seconds.
pub fn now_epoch() -> i64 {
    chrono::Utc::now().timestamp()
}
