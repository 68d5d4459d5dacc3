//! CLI: find a path through a JSON topology with learning automata.
//!
//! Usage: `lapath [OPTIONS] <topology.json> <src> <dest>`
//! Example: lapath tests/integration/diamond.json 0 3
//!
//! Prints the path as space-separated node ids, then optionally the run report and the learned
//! probabilities as JSON. Exits 1 when no path converged or the topology or config cannot be
//! loaded.
//!
//! Set RUST_LOG=lapath=trace for per-trial events.

use clap::Parser;
use lapath::{JsonTopology, LaConfig, LaSystem, NodeId, converge};
use std::path::PathBuf;
use std::process;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Find a path through a JSON topology with learning automata.
#[derive(Parser, Debug)]
#[command(name = "lapath")]
#[command(
  after_help = r#"Environment variables (overridden by the matching flags):
  LAPATH_ITERATIONS     Trials per path computation (default 3000).
  LAPATH_TIME_SLOT      Virtual clock increment between trials (default 0.001).
  LAPATH_SIZE_CLASSES   Buckets edge weights are binned into (default 8).
  LAPATH_SEED           Seed for reproducible tie-breaks.

A --config JSON file with the same fields (iterations, time_slot, size_classes,
seed) is read first; environment variables and flags override it.

Examples:
  lapath topology.json 0 19
  lapath --repeat 20 --dump topology.json 0 19
  lapath --config lapath.json --report topology.json 0 19"#
)]
struct Args {
  /// JSON configuration file.
  #[arg(long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Trials per path computation.
  #[arg(long, value_name = "N")]
  iterations: Option<usize>,

  /// Seed for the automata tie-break sources.
  #[arg(long, value_name = "SEED")]
  seed: Option<u64>,

  /// Number of path computations; learned state carries over between them.
  #[arg(long, value_name = "R", default_value_t = 1)]
  repeat: usize,

  /// Print the final run's report (path, length, trial counts) as JSON.
  #[arg(long)]
  report: bool,

  /// Print every automaton's probabilities as JSON after the run.
  #[arg(long)]
  dump: bool,

  /// Path to the JSON topology
  #[arg(value_name = "topology.json")]
  topology: PathBuf,

  /// Source node id
  src: NodeId,

  /// Destination node id
  dest: NodeId,
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();

  let mut config = match &args.config {
    Some(path) => match LaConfig::from_json_file(path) {
      Ok(config) => config.with_env(),
      Err(e) => {
        eprintln!("Error loading config: {}", e);
        process::exit(1);
      }
    },
    None => LaConfig::from_env(),
  };
  if let Some(iterations) = args.iterations {
    config.iterations = iterations;
  }
  if let Some(seed) = args.seed {
    config.seed = Some(seed);
  }
  info!(config = ?config, topology = %args.topology.display(), "lapath starting");

  let source = JsonTopology::from_path(&args.topology);
  let mut system = LaSystem::new(&source, config);
  if let Some(e) = system.load_error() {
    eprintln!("Error loading topology: {}", e);
    process::exit(1);
  }

  // Earlier rounds only train; the last one is reported.
  converge(&mut system, args.src, args.dest, args.repeat.max(1) - 1);
  let report = system.path_report(args.src, args.dest);
  info!(src = args.src, dest = args.dest, path = ?report.path, "path computed");

  let line: Vec<String> = report.path.iter().map(NodeId::to_string).collect();
  println!("{}", line.join(" "));

  if args.report {
    match serde_json::to_string(&report) {
      Ok(json) => println!("{}", json),
      Err(e) => {
        eprintln!("Error serializing report: {}", e);
        process::exit(1);
      }
    }
  }

  if args.dump {
    match serde_json::to_string_pretty(&system.bank().probabilities()) {
      Ok(json) => println!("{}", json),
      Err(e) => {
        eprintln!("Error serializing probabilities: {}", e);
        process::exit(1);
      }
    }
  }

  if !report.found() {
    process::exit(1);
  }
}
