//! Sampling session: one background collection run and its series.
//!
//! # Lifecycle
//!
//! ```text
//!  Pending ──(end < start)──────────────────────────────▶ Skipped
//!     │
//!     │ wait for start_time
//!     ▼
//!  Active ──(launch failed)──────────────────────────────▶ Failed
//!     │
//!     │ end_time reached
//!     ▼
//!  Draining ──(read/parse failed)────────────────────────▶ Failed
//!     │
//!     ▼
//!  Terminal
//! ```
//!
//! While `Active`, a session without an end time polls it once per second, so
//! [`Session::stop_collection_at`] from another thread ends collection within
//! about a second. A session that had an end time when the loop started sleeps
//! for the whole `end_time - start_time` in one go; moving the end time
//! afterwards has no effect on that sleep.
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use cpuutil::collector::MockSampler;
//! use cpuutil::session::{Session, SessionConfig, SessionState};
//! use cpuutil::analysis::WindowQuery;
//!
//! let session = Arc::new(
//!     Session::new(SessionConfig::new().lasting(0), MockSampler::typical_system(2, 3)).unwrap(),
//! );
//! let handle = session.start().unwrap();
//! assert_eq!(handle.join().unwrap().unwrap(), SessionState::Terminal);
//!
//! let usage = session.average_usage(WindowQuery::new()).unwrap();
//! assert_eq!(usage["all"]["%usr"], 20.0);
//! ```

mod config;
mod error;

pub use config::{DEFAULT_INTERVAL_SECS, SessionConfig};
pub use error::SessionError;

use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::analysis::{WindowQuery, compute_average};
use crate::collector::mpstat::parse_output;
use crate::collector::traits::{Sampler, SamplerProcess};
use crate::storage::model::{Aggregate, Family};
use crate::storage::series::{Series, SeriesSet};
use crate::util::now_epoch;

/// How often an open-ended session re-checks its end time.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Name of the background collection thread.
const THREAD_NAME: &str = "cpuutil-session";

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Created, collection loop not entered yet.
    Pending,
    /// Samplers running.
    Active,
    /// Samplers stopped, output being parsed into the series.
    Draining,
    /// Series complete.
    Terminal,
    /// Cancelled before collection started; series stay empty.
    Skipped,
    /// Launching, reading, or parsing a sampler failed.
    Failed,
}

impl SessionState {
    /// Whether the session reached a state it never leaves.
    pub fn is_finished(self) -> bool {
        matches!(
            self,
            SessionState::Terminal | SessionState::Skipped | SessionState::Failed
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Pending => "pending",
            SessionState::Active => "active",
            SessionState::Draining => "draining",
            SessionState::Terminal => "terminal",
            SessionState::Skipped => "skipped",
            SessionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One collection run over the four metric families.
///
/// The collection loop is the only writer of the series; any thread may stop
/// the session or query averages while it runs.
pub struct Session {
    start_time: i64,
    end_time: Mutex<Option<i64>>,
    interval: u64,
    state: Mutex<SessionState>,
    started: AtomicBool,
    sampler: Box<dyn Sampler>,
    series: SeriesSet,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("start_time", &self.start_time)
            .field("end_time", &self.end_time())
            .field("interval", &self.interval)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Creates a pending session.
    ///
    /// Fails with `ConfigConflict` when both an end time and a duration are
    /// set, and with `InvalidInterval` for a zero interval.
    pub fn new(
        config: SessionConfig,
        sampler: impl Sampler + 'static,
    ) -> Result<Self, SessionError> {
        let resolved = config.resolve(now_epoch())?;
        debug!(
            start_time = resolved.start_time,
            end_time = ?resolved.end_time,
            interval = resolved.interval,
            "session created"
        );

        Ok(Self {
            start_time: resolved.start_time,
            end_time: Mutex::new(resolved.end_time),
            interval: resolved.interval,
            state: Mutex::new(SessionState::Pending),
            started: AtomicBool::new(false),
            sampler: Box::new(sampler),
            series: SeriesSet::new(),
        })
    }

    pub fn start_time(&self) -> i64 {
        self.start_time
    }

    /// Current end time; `None` while open-ended.
    pub fn end_time(&self) -> Option<i64> {
        *self.end_time.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Series of one family. Empty until the session has drained.
    pub fn series(&self, family: Family) -> &Series {
        self.series.get(family)
    }

    /// Runs the collection loop on a background thread.
    pub fn start(
        self: &Arc<Self>,
    ) -> io::Result<JoinHandle<Result<SessionState, SessionError>>> {
        let session = Arc::clone(self);
        thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || session.run())
    }

    /// Runs the collection loop on the calling thread until the session finishes.
    ///
    /// Returns the final state, `Terminal` or `Skipped`. A session runs at most
    /// once; later calls fail with `AlreadyStarted`.
    pub fn run(&self) -> Result<SessionState, SessionError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(SessionError::AlreadyStarted);
        }

        let end_time = self.end_time();
        if let Some(end) = end_time
            && end < self.start_time
        {
            info!(
                start_time = self.start_time,
                end_time = end,
                "session stopped before start, nothing collected"
            );
            self.set_state(SessionState::Skipped);
            return Ok(SessionState::Skipped);
        }

        let now = now_epoch();
        if self.start_time > now {
            let wait = self.start_time.saturating_sub(now).unsigned_abs();
            debug!(wait_secs = wait, "waiting for session start");
            thread::sleep(Duration::from_secs(wait));
        }

        self.set_state(SessionState::Active);
        let mut processes = match self.launch_samplers() {
            Ok(processes) => processes,
            Err(e) => {
                error!(error = %e, "session failed to start");
                self.set_state(SessionState::Failed);
                return Err(e);
            }
        };
        info!(
            start_time = self.start_time,
            end_time = ?end_time,
            interval = self.interval,
            "collection started"
        );

        match end_time {
            None => self.poll_until_end(),
            Some(end) => {
                let duration = end.saturating_sub(self.start_time).unsigned_abs();
                debug!(duration_secs = duration, "sleeping until end time");
                thread::sleep(Duration::from_secs(duration));
            }
        }

        self.set_state(SessionState::Draining);
        match self.drain(&mut processes) {
            Ok(()) => {
                self.set_state(SessionState::Terminal);
                info!(
                    usage = self.series(Family::Usage).len(),
                    irq = self.series(Family::Irq).len(),
                    soft_irq = self.series(Family::SoftIrq).len(),
                    irq_sum = self.series(Family::IrqSum).len(),
                    "collection finished"
                );
                Ok(SessionState::Terminal)
            }
            Err(e) => {
                error!(error = %e, "session failed while draining");
                self.set_state(SessionState::Failed);
                Err(e)
            }
        }
    }

    /// Cancels collection: sets the end time to one second before the start.
    ///
    /// Before the loop starts this skips collection entirely; an open-ended
    /// running session stops at its next poll.
    pub fn stop_collection(&self) {
        self.set_end_time(self.start_time.saturating_sub(1));
    }

    /// Moves the end time, extending or shortening an open-ended session.
    pub fn stop_collection_at(&self, end_time: i64) {
        self.set_end_time(end_time);
    }

    /// Windowed averages of one family.
    pub fn average(&self, family: Family, query: WindowQuery) -> Result<Aggregate, SessionError> {
        compute_average(query, self.start_time, self.end_time(), self.series(family))
    }

    pub fn average_usage(&self, query: WindowQuery) -> Result<Aggregate, SessionError> {
        self.average(Family::Usage, query)
    }

    pub fn average_irq(&self, query: WindowQuery) -> Result<Aggregate, SessionError> {
        self.average(Family::Irq, query)
    }

    pub fn average_soft_irq(&self, query: WindowQuery) -> Result<Aggregate, SessionError> {
        self.average(Family::SoftIrq, query)
    }

    pub fn average_irq_sum(&self, query: WindowQuery) -> Result<Aggregate, SessionError> {
        self.average(Family::IrqSum, query)
    }

    fn set_end_time(&self, end_time: i64) {
        let mut guard = self.end_time.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = *guard;
        debug!(?previous, end_time, "end time updated");
        *guard = Some(end_time);
    }

    fn set_state(&self, state: SessionState) {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = *guard;
        debug!(from = %previous, to = %state, "session state changed");
        *guard = state;
    }

    /// Starts one sampler per family. On failure the ones already running are
    /// terminated before the error is returned.
    fn launch_samplers(&self) -> Result<Vec<(Family, Box<dyn SamplerProcess>)>, SessionError> {
        let mut processes: Vec<(Family, Box<dyn SamplerProcess>)> =
            Vec::with_capacity(Family::ALL.len());

        for family in Family::ALL {
            match self.sampler.start(family, self.interval) {
                Ok(process) => {
                    debug!(%family, destination = %process.destination(), "sampler launched");
                    processes.push((family, process));
                }
                Err(source) => {
                    terminate_all(&mut processes);
                    return Err(SessionError::Launch { family, source });
                }
            }
        }

        Ok(processes)
    }

    fn poll_until_end(&self) {
        loop {
            if let Some(end) = self.end_time()
                && now_epoch() >= end
            {
                return;
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Stops every sampler and appends its parsed output to the family series,
    /// stamping the k-th block with `start_time + k * interval`.
    fn drain(
        &self,
        processes: &mut [(Family, Box<dyn SamplerProcess>)],
    ) -> Result<(), SessionError> {
        terminate_all(processes);

        let step = i64::try_from(self.interval).unwrap_or(i64::MAX);
        for (family, process) in processes.iter_mut() {
            let family = *family;
            let raw = process
                .read_output()
                .map_err(|source| SessionError::Output { family, source })?;
            let records =
                parse_output(&raw).map_err(|source| SessionError::Parse { family, source })?;

            let series = self.series(family);
            let mut timestamp = self.start_time;
            for record in records {
                series.append(timestamp, record)?;
                timestamp = timestamp.saturating_add(step);
            }
            debug!(%family, samples = series.len(), "series populated");
        }

        Ok(())
    }
}

fn terminate_all(processes: &mut [(Family, Box<dyn SamplerProcess>)]) {
    for (family, process) in processes.iter_mut() {
        if let Err(e) = process.terminate() {
            warn!(
                %family,
                destination = %process.destination(),
                error = %e,
                "failed to stop sampler"
            );
        }
    }
}
