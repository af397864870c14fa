//! In-memory sampler for testing sessions without real processes.

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::collector::traits::{Sampler, SamplerProcess};
use crate::storage::model::Family;

/// Sampler returning canned output per family.
///
/// Families without configured output produce an empty string. Families
/// marked as failing refuse to start.
#[derive(Debug, Default)]
pub struct MockSampler {
    outputs: HashMap<Family, String>,
    failing: HashSet<Family>,
    launches: Mutex<Vec<(Family, u64)>>,
    terminated: Arc<AtomicUsize>,
}

impl MockSampler {
    /// Creates a sampler with no output for any family.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the raw output returned for `family`.
    pub fn with_output(mut self, family: Family, content: impl Into<String>) -> Self {
        self.outputs.insert(family, content.into());
        self
    }

    /// Makes starting `family` fail with `NotFound`.
    pub fn with_failure(mut self, family: Family) -> Self {
        self.failing.insert(family);
        self
    }

    /// Every successful start so far, as `(family, interval)`.
    pub fn launches(&self) -> Vec<(Family, u64)> {
        self.launches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of processes terminated so far.
    pub fn terminated(&self) -> usize {
        self.terminated.load(Ordering::SeqCst)
    }
}

impl Sampler for MockSampler {
    fn start(&self, family: Family, interval: u64) -> io::Result<Box<dyn SamplerProcess>> {
        if self.failing.contains(&family) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("mock sampler for {} unavailable", family),
            ));
        }

        self.launches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((family, interval));

        Ok(Box::new(MockProcess {
            family,
            output: self.outputs.get(&family).cloned().unwrap_or_default(),
            running: true,
            terminated: Arc::clone(&self.terminated),
        }))
    }
}

struct MockProcess {
    family: Family,
    output: String,
    running: bool,
    terminated: Arc<AtomicUsize>,
}

impl SamplerProcess for MockProcess {
    fn terminate(&mut self) -> io::Result<()> {
        if self.running {
            self.running = false;
            self.terminated.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn destination(&self) -> String {
        format!("memory://{}", self.family)
    }

    fn read_output(&mut self) -> io::Result<String> {
        Ok(self.output.clone())
    }
}
