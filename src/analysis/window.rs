//! Resolution of averaging windows against session defaults.

use serde::{Deserialize, Serialize};

use crate::session::SessionError;

/// Seconds added past the session end when a query gives no end of its own.
///
/// The last synthesized sample can land slightly past the configured deadline.
pub const END_MARGIN_SECS: i64 = 10;

/// Optional bounds of an average query.
///
/// At most one of `end_time` and `num_seconds` may be set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowQuery {
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub num_seconds: Option<u64>,
}

impl WindowQuery {
    /// Query covering the whole session.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(mut self, start_time: i64) -> Self {
        self.start_time = Some(start_time);
        self
    }

    pub fn ending_at(mut self, end_time: i64) -> Self {
        self.end_time = Some(end_time);
        self
    }

    pub fn lasting(mut self, num_seconds: u64) -> Self {
        self.num_seconds = Some(num_seconds);
        self
    }

    /// Turns the query into concrete bounds.
    ///
    /// The start defaults to `session_start`. The end is `start + num_seconds`
    /// when a duration is given, else the explicit end, else `session_end`
    /// plus [`END_MARGIN_SECS`]. A session without an end yields an unbounded
    /// window.
    pub fn resolve(
        &self,
        session_start: i64,
        session_end: Option<i64>,
    ) -> Result<Window, SessionError> {
        if let (Some(end_time), Some(num_seconds)) = (self.end_time, self.num_seconds) {
            return Err(SessionError::ConfigConflict {
                end_time,
                num_seconds,
            });
        }

        let start = self.start_time.unwrap_or(session_start);
        let end = match (self.num_seconds, self.end_time) {
            (Some(secs), _) => start.saturating_add(i64::try_from(secs).unwrap_or(i64::MAX)),
            (None, Some(end)) => end,
            (None, None) => session_end
                .map(|end| end.saturating_add(END_MARGIN_SECS))
                .unwrap_or(i64::MAX),
        };

        Ok(Window { start, end })
    }
}

/// Inclusive `[start, end]` range of sample timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: i64,
    pub end: i64,
}
