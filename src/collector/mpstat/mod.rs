//! `mpstat`-backed sampler.
//!
//! Each family gets its own `mpstat -P ALL <flags> <interval>` process whose
//! stdout goes to `<output_dir>/<prefix>_<suffix>.txt`. The files are parsed
//! once the processes are terminated.

pub mod parser;

use std::fs::{self, File};
use std::io;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

use tracing::{debug, warn};

use crate::collector::traits::{Sampler, SamplerProcess};
use crate::storage::model::Family;

pub use parser::{ParseError, parse_output};

/// Where and how mpstat is run.
#[derive(Debug, Clone)]
pub struct MpstatConfig {
    /// Path or name of the mpstat binary.
    pub binary: PathBuf,
    /// Directory receiving the raw output files.
    pub output_dir: PathBuf,
    /// Output file name prefix.
    pub prefix: String,
}

impl Default for MpstatConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("mpstat"),
            output_dir: PathBuf::from("."),
            prefix: "default".to_string(),
        }
    }
}

impl MpstatConfig {
    /// Raw output file of a family.
    pub fn output_path(&self, family: Family) -> PathBuf {
        self.output_dir
            .join(format!("{}_{}.txt", self.prefix, family.file_suffix()))
    }
}

/// Launches real mpstat processes.
#[derive(Debug, Clone, Default)]
pub struct MpstatSampler {
    config: MpstatConfig,
}

impl MpstatSampler {
    pub fn new(config: MpstatConfig) -> Self {
        Self { config }
    }
}

impl Sampler for MpstatSampler {
    fn start(&self, family: Family, interval: u64) -> io::Result<Box<dyn SamplerProcess>> {
        let path = self.config.output_path(family);
        // Truncate: output left over from an earlier run would shift every timestamp.
        let file = File::create(&path)?;

        let child = Command::new(&self.config.binary)
            .args(["-P", "ALL"])
            .args(family.mpstat_flags())
            .arg(interval.to_string())
            // C locale keeps '.' as decimal separator.
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .stdout(file)
            .stderr(Stdio::null())
            .spawn()?;

        debug!(
            %family,
            pid = child.id(),
            output = %path.display(),
            "mpstat started"
        );

        Ok(Box::new(MpstatProcess {
            family,
            path,
            child: Some(child),
        }))
    }
}

/// One running mpstat instance.
struct MpstatProcess {
    family: Family,
    path: PathBuf,
    child: Option<Child>,
}

impl SamplerProcess for MpstatProcess {
    fn terminate(&mut self) -> io::Result<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        if child.try_wait()?.is_none() {
            child.kill()?;
        }
        let status = child.wait()?;
        debug!(family = %self.family, %status, "mpstat terminated");
        Ok(())
    }

    fn destination(&self) -> String {
        self.path.display().to_string()
    }

    fn read_output(&mut self) -> io::Result<String> {
        fs::read_to_string(&self.path)
    }
}

impl Drop for MpstatProcess {
    fn drop(&mut self) {
        if self.child.is_some()
            && let Err(e) = self.terminate()
        {
            warn!(family = %self.family, error = %e, "failed to stop mpstat on drop");
        }
    }
}
