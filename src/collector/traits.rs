//! Abstractions over the external sampling tool.
//!
//! The `Sampler` trait lets a session drive real `mpstat` processes in
//! production and an in-memory implementation in tests, without the session
//! knowing which one it talks to.

use std::io;

use crate::storage::model::Family;

/// Launches one sampling process per metric family.
pub trait Sampler: Send + Sync {
    /// Starts sampling `family` every `interval` seconds.
    ///
    /// The returned process keeps writing output until terminated.
    fn start(&self, family: Family, interval: u64) -> io::Result<Box<dyn SamplerProcess>>;
}

/// A running sampler whose output is collected after termination.
pub trait SamplerProcess: Send {
    /// Stops the process and releases its output destination.
    ///
    /// Calling it on an already stopped process is not an error.
    fn terminate(&mut self) -> io::Result<()>;

    /// Human-readable description of where output goes (file path, stream name).
    fn destination(&self) -> String;

    /// Reads all raw output written so far.
    fn read_output(&mut self) -> io::Result<String>;
}

impl<S: Sampler + ?Sized> Sampler for std::sync::Arc<S> {
    fn start(&self, family: Family, interval: u64) -> io::Result<Box<dyn SamplerProcess>> {
        (**self).start(family, interval)
    }
}
