//! Sampler plumbing for per-CPU statistics.
//!
//! This module launches the external sampling tool (`mpstat` from sysstat),
//! one process per metric family, and parses its text output into records.
//! The `Sampler` trait lets sessions run against in-memory mocks in tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Session                            │
//! │                             │                               │
//! │                      ┌──────▼──────┐                        │
//! │                      │   Sampler   │ (trait)                │
//! │                      └──────┬──────┘                        │
//! └─────────────────────────────┼───────────────────────────────┘
//!                               │
//!               ┌───────────────┼───────────────┐
//!               │               │               │
//!        ┌──────▼──────┐ ┌──────▼──────┐ ┌──────▼──────┐
//!        │MpstatSampler│ │ MockSampler │ │  Scenarios  │
//!        │  (Linux)    │ │  (Testing)  │ │ (Fixtures)  │
//!        └──────┬──────┘ └─────────────┘ └─────────────┘
//!               │ <prefix>_{usage,irq,softirq,sum}.txt
//!        ┌──────▼──────┐
//!        │   parser    │ text → Vec<Record>
//!        └─────────────┘
//! ```
//!
//! # Usage
//!
//! ## Production (Linux)
//!
//! ```ignore
//! use cpuutil::collector::{MpstatConfig, MpstatSampler};
//!
//! let sampler = MpstatSampler::new(MpstatConfig {
//!     output_dir: "/var/tmp".into(),
//!     ..MpstatConfig::default()
//! });
//! ```
//!
//! ## Testing (with MockSampler)
//!
//! ```
//! use cpuutil::collector::{MockSampler, Sampler};
//! use cpuutil::storage::Family;
//!
//! let sampler = MockSampler::typical_system(4, 10);
//! let mut process = sampler.start(Family::Usage, 1).unwrap();
//! assert!(!process.read_output().unwrap().is_empty());
//! ```

pub mod mock;
pub mod mpstat;
pub mod traits;

pub use mock::MockSampler;
pub use mpstat::{MpstatConfig, MpstatSampler, ParseError, parse_output};
pub use traits::{Sampler, SamplerProcess};
