//! Collection window and sampling interval of a session.

use serde::{Deserialize, Serialize};

use super::error::SessionError;

/// Sampling interval used when none is configured.
pub const DEFAULT_INTERVAL_SECS: u64 = 1;

/// Requested timing of a session. Unset fields fall back to defaults when the
/// session is created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unix timestamp collection starts at. Defaults to now.
    pub start_time: Option<i64>,
    /// Unix timestamp collection stops at. Unset means until stopped.
    pub end_time: Option<i64>,
    /// Collection length in seconds, alternative to `end_time`.
    pub num_seconds: Option<u64>,
    /// Sampling interval in seconds. Defaults to [`DEFAULT_INTERVAL_SECS`].
    pub interval: Option<u64>,
}

/// Timing after defaults have been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ResolvedConfig {
    pub start_time: i64,
    pub end_time: Option<i64>,
    pub interval: u64,
}

impl SessionConfig {
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

    pub fn every(mut self, interval: u64) -> Self {
        self.interval = Some(interval);
        self
    }

    pub(crate) fn resolve(&self, now: i64) -> Result<ResolvedConfig, SessionError> {
        if let (Some(end_time), Some(num_seconds)) = (self.end_time, self.num_seconds) {
            return Err(SessionError::ConfigConflict {
                end_time,
                num_seconds,
            });
        }

        let interval = self.interval.unwrap_or(DEFAULT_INTERVAL_SECS);
        if interval == 0 {
            return Err(SessionError::InvalidInterval);
        }

        let start_time = self.start_time.unwrap_or(now);
        let end_time = match self.num_seconds {
            Some(secs) => Some(start_time.saturating_add(i64::try_from(secs).unwrap_or(i64::MAX))),
            None => self.end_time,
        };

        Ok(ResolvedConfig {
            start_time,
            end_time,
            interval,
        })
    }
}
