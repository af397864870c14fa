use std::fmt;
use std::io;

use crate::collector::mpstat::ParseError;
use crate::storage::model::Family;

/// Errors raised while configuring, running, or querying a session.
#[derive(Debug)]
pub enum SessionError {
    /// Both an end time and a duration were given.
    ConfigConflict { end_time: i64, num_seconds: u64 },
    /// Sampling interval of zero seconds.
    InvalidInterval,
    /// The collection loop was already entered once.
    AlreadyStarted,
    /// A sample older than the newest one was appended.
    OutOfOrder {
        family: Family,
        last: i64,
        timestamp: i64,
    },
    /// The sampler process of a family could not be launched.
    Launch { family: Family, source: io::Error },
    /// The raw output of a family could not be read back.
    Output { family: Family, source: io::Error },
    /// The raw output of a family is malformed.
    Parse { family: Family, source: ParseError },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::ConfigConflict {
                end_time,
                num_seconds,
            } => write!(
                f,
                "only one of end time ({}) and duration ({}s) can be set",
                end_time, num_seconds
            ),
            SessionError::InvalidInterval => write!(f, "sampling interval must be at least 1s"),
            SessionError::AlreadyStarted => write!(f, "session collection already started"),
            SessionError::OutOfOrder {
                family,
                last,
                timestamp,
            } => write!(
                f,
                "{} sample at {} is older than last sample at {}",
                family, timestamp, last
            ),
            SessionError::Launch { family, source } => {
                write!(f, "failed to launch {} sampler: {}", family, source)
            }
            SessionError::Output { family, source } => {
                write!(f, "failed to read {} sampler output: {}", family, source)
            }
            SessionError::Parse { family, source } => {
                write!(f, "malformed {} sampler output: {}", family, source)
            }
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Launch { source, .. } | SessionError::Output { source, .. } => {
                Some(source)
            }
            SessionError::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display_config_conflict() {
        let err = SessionError::ConfigConflict {
            end_time: 100,
            num_seconds: 30,
        };
        assert_eq!(
            err.to_string(),
            "only one of end time (100) and duration (30s) can be set"
        );
        assert!(err.source().is_none());
    }

    #[test]
    fn test_parse_error_is_chained() {
        let err = SessionError::Parse {
            family: Family::Irq,
            source: ParseError::MultipleHeaders { block: 2 },
        };
        assert_eq!(
            err.to_string(),
            "malformed irq sampler output: multiple headers found in block 2"
        );
        assert!(err.source().is_some());
    }
}
