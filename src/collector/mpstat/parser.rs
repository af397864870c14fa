//! Parser for `mpstat -P ALL` text output.
//!
//! These are pure functions over the raw text, easily testable with string
//! inputs. mpstat prints one block per interval:
//!
//! ```text
//! Linux 6.1.0 (host)  03/14/2024  _x86_64_  (4 CPU)
//!
//! 10:00:01 AM  CPU    %usr   %nice    %sys %iowait    %irq   %soft  %steal  %guest  %gnice   %idle
//! 10:00:02 AM  all    2.51    0.00    1.00    0.00    0.00    0.25    0.00    0.00    0.00   96.24
//! 10:00:02 AM    0    3.00    0.00    1.00    0.00    0.00    1.00    0.00    0.00    0.00   95.00
//! ```
//!
//! The banner is skipped, each blank-line separated block yields one `Record`.

use std::fmt;

use crate::storage::model::{MetricMap, Record};

/// Prefix of the platform banner line mpstat prints first.
const BANNER_PREFIX: &str = "Linux";

/// Column name that marks a header line.
const HEADER_MARKER: &str = "CPU";

/// Error type for malformed mpstat output.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// A block contains more than one header line.
    MultipleHeaders { block: usize },
    /// A data line appears before the header of its block.
    MissingHeader { block: usize, line: String },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MultipleHeaders { block } => {
                write!(f, "multiple headers found in block {}", block)
            }
            ParseError::MissingHeader { block, line } => {
                write!(f, "data line before header in block {}: '{}'", block, line)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Classified content of one output line.
#[derive(Debug, PartialEq)]
enum Line<'a> {
    /// `HH:MM:SS [AM|PM] CPU <names...>`
    Header(Vec<&'a str>),
    /// `HH:MM:SS [AM|PM] <all|N> <values...>`
    Data(&'a str, Vec<&'a str>),
    /// Anything else (`Average:` summaries, stray text).
    Other,
}

fn is_clock(token: &str) -> bool {
    let bytes = token.as_bytes();
    bytes.len() == 8
        && bytes[2] == b':'
        && bytes[5] == b':'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 2 || i == 5 || b.is_ascii_digit())
}

fn is_cpu_id(token: &str) -> bool {
    token == "all" || (!token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()))
}

fn classify(line: &str) -> Line<'_> {
    let mut fields = line.split_whitespace().peekable();

    match fields.next() {
        Some(clock) if is_clock(clock) => {}
        _ => return Line::Other,
    }
    if let Some(&meridiem) = fields.peek()
        && (meridiem == "AM" || meridiem == "PM")
    {
        fields.next();
    }

    match fields.next() {
        Some(HEADER_MARKER) => Line::Header(fields.collect()),
        Some(cpu) if is_cpu_id(cpu) => Line::Data(cpu, fields.collect()),
        _ => Line::Other,
    }
}

/// Splits raw output into blocks of non-empty lines.
///
/// Banner lines are dropped, trailing whitespace is trimmed, and runs of blank
/// lines count as a single separator.
pub fn split_blocks(content: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();

    for line in content.lines() {
        if line.starts_with(BANNER_PREFIX) {
            continue;
        }
        let line = line.trim_end();
        if line.is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }

    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

/// Parses one block into a record.
///
/// Data values are zipped positionally against the header names; surplus
/// values or names are dropped. `index` is only used in error reports.
pub fn parse_block(index: usize, lines: &[&str]) -> Result<Record, ParseError> {
    let mut keys: Option<Vec<&str>> = None;
    let mut record = Record::new();

    for line in lines {
        match classify(line) {
            Line::Header(names) => {
                if keys.is_some() {
                    return Err(ParseError::MultipleHeaders { block: index });
                }
                keys = Some(names);
            }
            Line::Data(cpu, values) => {
                let keys = keys.as_ref().ok_or_else(|| ParseError::MissingHeader {
                    block: index,
                    line: line.to_string(),
                })?;
                let metrics: MetricMap = keys
                    .iter()
                    .zip(values)
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect();
                record.insert(cpu.to_string(), metrics);
            }
            Line::Other => {}
        }
    }

    Ok(record)
}

/// Parses a whole mpstat output into one record per block, in file order.
///
/// Blocks without data lines still produce an (empty) record so that block
/// positions keep lining up with sampling intervals.
pub fn parse_output(content: &str) -> Result<Vec<Record>, ParseError> {
    split_blocks(content)
        .iter()
        .enumerate()
        .map(|(i, block)| parse_block(i, block))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const USAGE_OUTPUT: &str = "\
Linux 6.1.0-18-amd64 (build01) \t03/14/2024 \t_x86_64_\t(2 CPU)

10:00:01 AM  CPU    %usr   %nice    %sys %iowait    %irq   %soft  %steal  %guest  %gnice   %idle
10:00:02 AM  all    2.51    0.00    1.00    0.00    0.00    0.25    0.00    0.00    0.00   96.24
10:00:02 AM    0    3.00    0.00    1.00    0.00    0.00    0.50    0.00    0.00    0.00   95.50
10:00:02 AM    1    2.02    0.00    1.01    0.00    0.00    0.00    0.00    0.00    0.00   96.97

10:00:02 AM  CPU    %usr   %nice    %sys %iowait    %irq   %soft  %steal  %guest  %gnice   %idle
10:00:03 AM  all    5.00    0.00    2.00    0.00    0.00    0.00    0.00    0.00    0.00   93.00
10:00:03 AM    0    6.00    0.00    2.00    0.00    0.00    0.00    0.00    0.00    0.00   92.00
10:00:03 AM    1    4.00    0.00    2.00    0.00    0.00    0.00    0.00    0.00    0.00   94.00
";

    #[test]
    fn test_classify_header_and_data() {
        assert_eq!(
            classify("10:00:01 AM  CPU    %usr   %idle"),
            Line::Header(vec!["%usr", "%idle"])
        );
        assert_eq!(
            classify("10:00:02 PM  all    2.51   96.24"),
            Line::Data("all", vec!["2.51", "96.24"])
        );
        assert_eq!(
            classify("10:00:02 PM   12    2.51   96.24"),
            Line::Data("12", vec!["2.51", "96.24"])
        );
    }

    #[test]
    fn test_classify_24h_clock() {
        assert_eq!(
            classify("22:00:01     CPU    intr/s"),
            Line::Header(vec!["intr/s"])
        );
        assert_eq!(
            classify("22:00:02     all    1024.00"),
            Line::Data("all", vec!["1024.00"])
        );
    }

    #[test]
    fn test_classify_ignores_other_lines() {
        assert_eq!(classify("Average:     all    2.51   96.24"), Line::Other);
        assert_eq!(classify("10:00:02 AM  cpu0   2.51"), Line::Other);
        assert_eq!(classify("1:00:02 AM  all   2.51"), Line::Other);
        assert_eq!(classify(""), Line::Other);
    }

    #[test]
    fn test_split_blocks_skips_banner_and_blank_runs() {
        let content = "Linux 6.1 (host)\n\n\na\nb  \n\n\n\nc\n";
        let blocks = split_blocks(content);
        assert_eq!(blocks, vec![vec!["a", "b"], vec!["c"]]);
    }

    #[test]
    fn test_parse_output_usage() {
        let records = parse_output(USAGE_OUTPUT).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.len(), 3);
        assert_eq!(first["all"]["%usr"], "2.51");
        assert_eq!(first["all"]["%idle"], "96.24");
        assert_eq!(first["1"]["%sys"], "1.01");
        assert_eq!(first["0"].len(), 10);

        assert_eq!(records[1]["0"]["%usr"], "6.00");
    }

    #[test]
    fn test_parse_output_irq_sum() {
        let content = "\
Linux 6.1.0 (host) \t03/14/2024 \t_x86_64_\t(2 CPU)

10:00:01 AM  CPU    intr/s
10:00:02 AM  all    812.00
10:00:02 AM    0    400.00
10:00:02 AM    1    412.00
";
        let records = parse_output(content).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["all"]["intr/s"], "812.00");
        assert_eq!(records[0]["1"]["intr/s"], "412.00");
    }

    #[test]
    fn test_parse_block_multiple_headers() {
        let block = [
            "10:00:01 AM  CPU    %usr",
            "10:00:02 AM  all    2.51",
            "10:00:02 AM  CPU    %usr",
        ];
        assert_eq!(
            parse_block(3, &block),
            Err(ParseError::MultipleHeaders { block: 3 })
        );
    }

    #[test]
    fn test_parse_output_multiple_headers_rejected() {
        let content = "\
10:00:01 AM  CPU    %usr
10:00:01 AM  CPU    %sys
10:00:02 AM  all    2.51
";
        let err = parse_output(content).unwrap_err();
        assert_eq!(err, ParseError::MultipleHeaders { block: 0 });
        assert_eq!(err.to_string(), "multiple headers found in block 0");
    }

    #[test]
    fn test_parse_block_missing_header() {
        let block = ["10:00:02 AM  all    2.51"];
        assert!(matches!(
            parse_block(0, &block),
            Err(ParseError::MissingHeader { block: 0, .. })
        ));
    }

    #[test]
    fn test_parse_block_zip_truncates() {
        let block = ["10:00:01 AM  CPU  a  b  c", "10:00:02 AM  all  1  2"];
        let record = parse_block(0, &block).unwrap();
        assert_eq!(record["all"].len(), 2);
        assert!(!record["all"].contains_key("c"));
    }

    #[test]
    fn test_parse_output_keeps_empty_blocks() {
        let content = "\
10:00:01 AM  CPU    %usr
10:00:02 AM  all    2.51

Average:     CPU    %usr
Average:     all    2.51
";
        let records = parse_output(content).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[1].is_empty());
    }

    #[test]
    fn test_parse_output_empty() {
        assert!(parse_output("").unwrap().is_empty());
        assert!(parse_output("Linux 6.1 (host)\n").unwrap().is_empty());
    }
}
