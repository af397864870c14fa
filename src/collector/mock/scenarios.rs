//! Pre-built mpstat output scenarios for testing.
//!
//! The generated text follows what `mpstat -P ALL` prints under the C locale:
//! a platform banner, then one block per interval. Values are derived from the
//! block index so averages are easy to predict in assertions.

use std::fmt::Write;

use super::sampler::MockSampler;
use crate::storage::model::Family;

const BANNER: &str = "Linux 6.1.0-18-amd64 (mock) \t03/14/2024 \t_x86_64_\t";

fn clock(block: usize) -> String {
    let secs = block + 1;
    format!("10:{:02}:{:02} AM", (secs / 60) % 60, secs % 60)
}

fn render(
    cpus: usize,
    blocks: usize,
    header: &str,
    row: impl Fn(usize, Option<usize>) -> String,
) -> String {
    let mut out = format!("{}({} CPU)\n", BANNER, cpus);
    for block in 0..blocks {
        out.push('\n');
        let _ = writeln!(out, "{}  CPU  {}", clock(block), header);
        let _ = writeln!(out, "{}  all  {}", clock(block), row(block, None));
        for cpu in 0..cpus {
            let _ = writeln!(
                out,
                "{}  {:>3}  {}",
                clock(block),
                cpu,
                row(block, Some(cpu))
            );
        }
    }
    out
}

/// `mpstat -P ALL -u` output. `%usr` is `10 * (block + 1)` on every line.
pub fn usage_output(cpus: usize, blocks: usize) -> String {
    render(
        cpus,
        blocks,
        "%usr  %nice  %sys  %iowait  %irq  %soft  %steal  %guest  %gnice  %idle",
        |block, _| {
            let usr = 10.0 * (block + 1) as f64;
            format!(
                "{:.2}  0.00  5.00  0.00  0.00  0.00  0.00  0.00  0.00  {:.2}",
                usr,
                95.0 - usr
            )
        },
    )
}

/// `mpstat -P ALL -I CPU` output. `LOC/s` is `100 * (block + 1)`.
pub fn irq_output(cpus: usize, blocks: usize) -> String {
    render(cpus, blocks, "0/s  9/s  LOC/s", |block, _| {
        format!("0.00  1.00  {:.2}", 100.0 * (block + 1) as f64)
    })
}

/// `mpstat -P ALL -I SCPU` output. `TIMER/s` is `50 * (block + 1)`.
pub fn soft_irq_output(cpus: usize, blocks: usize) -> String {
    render(
        cpus,
        blocks,
        "HI/s  TIMER/s  NET_TX/s  NET_RX/s  BLOCK/s  SCHED/s  RCU/s",
        |block, _| {
            format!(
                "0.00  {:.2}  0.00  2.00  0.00  10.00  4.00",
                50.0 * (block + 1) as f64
            )
        },
    )
}

/// `mpstat -P ALL -I SUM` output. `intr/s` is `1000 * (block + 1)` on the
/// `all` line and a share of it per CPU.
pub fn irq_sum_output(cpus: usize, blocks: usize) -> String {
    render(cpus, blocks, "intr/s", |block, cpu| {
        let total = 1000.0 * (block + 1) as f64;
        match cpu {
            None => format!("{:.2}", total),
            Some(_) => format!("{:.2}", total / cpus.max(1) as f64),
        }
    })
}

impl MockSampler {
    /// All four families with `blocks` intervals of output on `cpus` CPUs.
    pub fn typical_system(cpus: usize, blocks: usize) -> Self {
        Self::new()
            .with_output(Family::Usage, usage_output(cpus, blocks))
            .with_output(Family::Irq, irq_output(cpus, blocks))
            .with_output(Family::SoftIrq, soft_irq_output(cpus, blocks))
            .with_output(Family::IrqSum, irq_sum_output(cpus, blocks))
    }

    /// Valid usage output but a hardware interrupt block with two headers.
    pub fn malformed_irq() -> Self {
        let irq = "\
10:00:01 AM  CPU  LOC/s
10:00:02 AM  all  100.00
10:00:02 AM  CPU  LOC/s
10:00:02 AM    0  100.00
";
        Self::new()
            .with_output(Family::Usage, usage_output(1, 2))
            .with_output(Family::Irq, irq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mpstat::parse_output;

    #[test]
    fn test_usage_output_parses() {
        let records = parse_output(&usage_output(2, 3)).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].len(), 3);
        assert_eq!(records[2]["all"]["%usr"], "30.00");
        assert_eq!(records[2]["1"]["%idle"], "65.00");
    }

    #[test]
    fn test_irq_sum_output_splits_total() {
        let records = parse_output(&irq_sum_output(4, 1)).unwrap();
        assert_eq!(records[0]["all"]["intr/s"], "1000.00");
        assert_eq!(records[0]["3"]["intr/s"], "250.00");
    }

    #[test]
    fn test_all_scenarios_have_matching_block_counts() {
        for output in [
            irq_output(2, 5),
            soft_irq_output(2, 5),
            usage_output(2, 5),
            irq_sum_output(2, 5),
        ] {
            assert_eq!(parse_output(&output).unwrap().len(), 5);
        }
    }

    #[test]
    fn test_clock_rolls_over_minutes() {
        assert_eq!(clock(0), "10:00:01 AM");
        assert_eq!(clock(59), "10:01:00 AM");
    }
}
