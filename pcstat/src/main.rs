//! Report how much of each file is resident in the page cache.
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use env_logger::Env;
use log::{error, warn};

use pcstat::format::{Formatter, OutputMode};
use pcstat::namespace::MountNamespaceGate;
use pcstat::process::Process;
use pcstat::{terminal_columns, top_k, CacheStatus, PcResult, Prober};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Also show every file mapped by the given pid
    #[arg(long, value_name = "PID")]
    pid: Option<i32>,

    /// Show terse (CSV) output
    #[arg(long, group = "mode")]
    terse: bool,

    /// Return data in JSON format
    #[cfg(feature = "serde1")]
    #[arg(long, group = "mode")]
    json: bool,

    /// Draw the table with box-drawing characters
    #[arg(long, group = "mode")]
    unicode: bool,

    /// Print aligned columns without a grid
    #[arg(long, group = "mode")]
    plain: bool,

    /// Print a simple histogram instead of raw data
    #[arg(long, group = "mode")]
    histo: bool,

    /// Omit the header from table, plain and terse output
    #[arg(long)]
    nohdr: bool,

    /// Include the per-page status in JSON output
    #[arg(long)]
    pps: bool,

    /// Convert paths to basename to narrow the output
    #[arg(long)]
    bname: bool,

    /// Only show the N files with the most cached pages
    #[arg(long, value_name = "N")]
    top: Option<usize>,

    /// Files to inspect
    files: Vec<PathBuf>,
}

impl Args {
    #[cfg(feature = "serde1")]
    fn json_mode(&self) -> Option<OutputMode> {
        self.json.then_some(OutputMode::Json)
    }

    #[cfg(not(feature = "serde1"))]
    fn json_mode(&self) -> Option<OutputMode> {
        None
    }

    fn mode(&self) -> OutputMode {
        if let Some(mode) = self.json_mode() {
            mode
        } else if self.terse {
            OutputMode::Terse
        } else if self.histo {
            OutputMode::Histogram
        } else if self.unicode {
            OutputMode::Unicode
        } else if self.plain {
            OutputMode::Plain
        } else {
            OutputMode::Table
        }
    }
}

/// Enters the mount namespace of `pid` and returns the files it has mapped, sorted.
///
/// A failed switch is only logged: the maps can still be read, and explicit paths still make
/// sense in our own namespace.
fn pid_files(pid: i32) -> PcResult<Vec<PathBuf>> {
    // open /proc/<pid> first, it may not be visible from the target namespace
    let target = Process::new(pid)?;

    let mut gate = MountNamespaceGate::new();
    if let Err(e) = Process::myself().and_then(|me| gate.ensure_process(&me, &target)) {
        warn!("{}", e);
    }

    let mut files: Vec<PathBuf> = target.mapped_files()?.into_iter().collect();
    files.sort();
    Ok(files)
}

fn report(args: &Args, files: &[PathBuf]) -> PcResult<()> {
    let prober = Prober::new().keep_pages(args.pps || args.histo);

    let mut stats = Vec::with_capacity(files.len());
    for file in files {
        match prober.stat(file) {
            Ok(stat) => stats.push(stat),
            Err(e) if e.is_per_file() => warn!("skipping {:?}: {}", file, e),
            Err(e) => return Err(e),
        }
    }

    if let Some(k) = args.top {
        stats = top_k(stats, k)?;
    }
    if args.bname {
        stats = stats.into_iter().map(CacheStatus::with_basename).collect();
    }

    let formatter = Formatter::new(args.mode())
        .header(!args.nohdr)
        .terminal_columns(terminal_columns().unwrap_or(80));
    formatter.write(&mut io::stdout().lock(), &stats)
}

fn main() -> ExitCode {
    env_logger::init_from_env(Env::default().default_filter_or("warn"));

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() { ExitCode::FAILURE } else { ExitCode::SUCCESS };
        }
    };

    let mut files = args.files.clone();
    if let Some(pid) = args.pid {
        match pid_files(pid) {
            Ok(mapped) => files.extend(mapped),
            Err(e) => {
                error!("{}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    if files.is_empty() {
        eprintln!("{}", Args::command().render_usage());
        return ExitCode::FAILURE;
    }

    match report(&args, &files) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
