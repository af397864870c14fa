//! cpuutil - per-CPU utilization and interrupt sampler.
//!
//! Runs one sampling session through mpstat and prints the windowed
//! averages of all four metric families once collection ends.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::cmp::Ordering as CmpOrdering;
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::path::PathBuf;
use std::process::{self, ExitCode};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use clap::Parser;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

use cpuutil::collector::{MpstatConfig, MpstatSampler};
use cpuutil::storage::model::ALL_CPUS;
use cpuutil::util::{now_epoch, parse_duration_secs, parse_time};
use cpuutil::{Aggregate, Family, Session, SessionConfig, WindowQuery};

/// Samples per-CPU statistics and reports windowed averages.
#[derive(Parser)]
#[command(
    name = "cpuutil",
    about = "Per-CPU utilization and interrupt sampler",
    version
)]
struct Args {
    /// Collection start (unix timestamp, ISO 8601, +30s, 07:00). Defaults to now.
    #[arg(long, value_parser = parse_time)]
    start: Option<i64>,

    /// Collection end. Without --end or --seconds, runs until Ctrl-C.
    #[arg(long, value_parser = parse_time)]
    end: Option<i64>,

    /// Collection length (90, 90s, 5m, 1h).
    #[arg(short = 'n', long, value_parser = parse_duration_secs)]
    seconds: Option<u64>,

    /// Sampling interval in seconds.
    #[arg(short, long, default_value = "1")]
    interval: u64,

    /// Directory receiving the raw mpstat output files.
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Output file name prefix.
    #[arg(long, default_value = "default")]
    prefix: String,

    /// Path to the mpstat binary.
    #[arg(long, default_value = "mpstat")]
    mpstat: PathBuf,

    /// Start of the averaging window. Defaults to the session start.
    #[arg(long, value_parser = parse_time)]
    window_start: Option<i64>,

    /// End of the averaging window.
    #[arg(long, value_parser = parse_time)]
    window_end: Option<i64>,

    /// Length of the averaging window, alternative to --window-end.
    #[arg(long, value_parser = parse_duration_secs)]
    window_seconds: Option<u64>,

    /// Print averages as JSON.
    #[arg(long)]
    json: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("cpuutil={}", level).parse() {
        filter = filter.add_directive(directive);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Orders CPU ids as `all` first, then cores numerically, then anything else.
fn cpu_order(a: &str, b: &str) -> CmpOrdering {
    match (a == ALL_CPUS, b == ALL_CPUS) {
        (true, true) => return CmpOrdering::Equal,
        (true, false) => return CmpOrdering::Less,
        (false, true) => return CmpOrdering::Greater,
        (false, false) => {}
    }
    match (a.parse::<u32>(), b.parse::<u32>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Err(_), Ok(_)) => CmpOrdering::Greater,
        (Ok(_), Err(_)) => CmpOrdering::Less,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Renders one family's averages as a table, one row per CPU.
fn format_aggregate(family: Family, aggregate: &Aggregate) -> String {
    let mut out = format!("== {} ==\n", family);
    if aggregate.is_empty() {
        out.push_str("(no samples)\n");
        return out;
    }

    let metrics: BTreeSet<&str> = aggregate
        .values()
        .flat_map(|metrics| metrics.keys().map(String::as_str))
        .collect();
    let width = metrics.iter().map(|m| m.len()).max().unwrap_or(0).max(8);

    out.push_str(&format!("{:<6}", "CPU"));
    for metric in &metrics {
        out.push_str(&format!(" {:>width$}", metric));
    }
    out.push('\n');

    let mut cpus: Vec<&String> = aggregate.keys().collect();
    cpus.sort_by(|a, b| cpu_order(a, b));
    for cpu in cpus {
        out.push_str(&format!("{:<6}", cpu));
        for metric in &metrics {
            match aggregate[cpu].get(*metric) {
                Some(value) => out.push_str(&format!(" {:>width$.2}", value)),
                None => out.push_str(&format!(" {:>width$}", "-")),
            }
        }
        out.push('\n');
    }
    out
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let sampler = MpstatSampler::new(MpstatConfig {
        binary: args.mpstat.clone(),
        output_dir: args.output_dir.clone(),
        prefix: args.prefix.clone(),
    });
    let config = SessionConfig {
        start_time: args.start,
        end_time: args.end,
        num_seconds: args.seconds,
        interval: Some(args.interval),
    };
    let session = Arc::new(Session::new(config, sampler)?);

    info!("cpuutil {} starting", env!("CARGO_PKG_VERSION"));
    info!(
        start_time = session.start_time(),
        end_time = ?session.end_time(),
        interval = session.interval(),
        output_dir = %args.output_dir.display(),
        "session configured"
    );

    // First Ctrl-C ends collection and keeps the data, second one exits.
    let signals = AtomicUsize::new(0);
    let handler_session = Arc::clone(&session);
    if let Err(e) = ctrlc::set_handler(move || {
        if signals.fetch_add(1, Ordering::SeqCst) == 0 {
            info!("Received shutdown signal, draining collected samples");
            handler_session.stop_collection_at(now_epoch());
        } else {
            warn!("Received second shutdown signal, exiting");
            process::exit(130);
        }
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    let handle = session.start()?;
    let state = handle
        .join()
        .map_err(|_| "session thread panicked")??;
    info!(%state, "session finished");

    let query = WindowQuery {
        start_time: args.window_start,
        end_time: args.window_end,
        num_seconds: args.window_seconds,
    };
    let mut report: BTreeMap<String, Aggregate> = BTreeMap::new();
    for family in Family::ALL {
        report.insert(family.to_string(), session.average(family, query)?);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for family in Family::ALL {
            if let Some(aggregate) = report.get(&family.to_string()) {
                print!("{}", format_aggregate(family, aggregate));
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
