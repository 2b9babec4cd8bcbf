use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, ValueEnum};

use resurge::engine::{run_query, QueryOutput};
use resurge::graph::loader::parse_edge_file;
use resurge::kernel::{Bfs, Components, Sssp};
use resurge::logging::init_logging;
use resurge::{EngineConfig, Result, Scheduling};

#[derive(Copy, Clone, Debug, ValueEnum)]
enum AppKind {
    /// Single-source shortest paths.
    Sssp,
    /// Breadth-first distance.
    Bfs,
    /// Connected components by min-label propagation.
    Cc,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SchedulingArg {
    Chunked,
    WorkStealing,
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Bulk-synchronous engine for incremental monotonic graph traversal"
)]
struct Args {
    /// Edge list file: `src dst [weight]` per line.
    #[arg(long)]
    efile: PathBuf,

    /// Edge-delta file; omitting it disables the incremental phase.
    #[arg(long)]
    efile_update: Option<PathBuf>,

    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    directed: bool,

    #[arg(long, value_enum, default_value_t = AppKind::Sssp)]
    app: AppKind,

    /// Source gid for sssp and bfs.
    #[arg(long, default_value_t = 0)]
    source: u64,

    #[arg(long, default_value_t = 1)]
    workers: usize,

    /// Threads per worker pool.
    #[arg(long, default_value_t = 4)]
    threads: usize,

    #[arg(long, value_enum, default_value_t = SchedulingArg::Chunked)]
    scheduling: SchedulingArg,

    /// Output path; stdout when omitted.
    #[arg(long)]
    output: Option<PathBuf>,

    #[arg(long, default_value = "info")]
    log: String,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("resurge: {e}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log)?;

    let edges = parse_edge_file(&args.efile)?;
    let config = EngineConfig {
        workers: args.workers,
        threads: args.threads,
        directed: args.directed,
        update_path: args.efile_update.clone(),
        scheduling: match args.scheduling {
            SchedulingArg::Chunked => Scheduling::Chunked,
            SchedulingArg::WorkStealing => Scheduling::WorkStealing,
        },
    };

    match args.app {
        AppKind::Sssp => emit(run_query(&edges, &Sssp::new(args.source), &config)?, &args),
        AppKind::Bfs => emit(run_query(&edges, &Bfs::new(args.source), &config)?, &args),
        AppKind::Cc => emit(run_query(&edges, &Components::new(), &config)?, &args),
    }
}

fn emit<V: Display>(output: QueryOutput<V>, args: &Args) -> Result<()> {
    let mut sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };
    for (gid, value) in &output.values {
        writeln!(sink, "{gid} {value}")?;
    }
    sink.flush()?;
    Ok(())
}
