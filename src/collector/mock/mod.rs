//! Mock sampler implementations for testing.
//!
//! This module provides `MockSampler` and pre-built output scenarios for
//! testing sessions without spawning mpstat.

mod sampler;
mod scenarios;

pub use sampler::MockSampler;
pub use scenarios::{irq_output, irq_sum_output, soft_irq_output, usage_output};
