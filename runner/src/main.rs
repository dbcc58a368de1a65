use std::fs::File;
use std::io::{self, BufReader};
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use simulator::{
    multilevel_feedback, priority, round_robin, Simulation, SimulationReport, Workload,
};

mod input;
mod output;

/// Simulates a workload of processes on a single CPU, tick by tick, under a
/// chosen scheduling policy.
#[derive(Debug, Parser)]
#[command(name = "runner")]
struct Args {
    /// Scheduling algorithm: rr, prio or mlfq
    #[arg(long = "alg", default_value = "rr")]
    alg: String,

    /// Time quantum for the quantum-based policies
    #[arg(long = "q", default_value_t = NonZeroU32::new(10).unwrap())]
    quantum: NonZeroU32,

    /// Workload file; standard input when omitted
    #[arg(long = "input")]
    input: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Algorithm {
    RoundRobin,
    Priority,
    MultilevelFeedback,
}

impl FromStr for Algorithm {
    type Err = RunnerError;

    fn from_str(s: &str) -> Result<Algorithm, RunnerError> {
        match s {
            "rr" => Ok(Algorithm::RoundRobin),
            "prio" => Ok(Algorithm::Priority),
            "mlfq" => Ok(Algorithm::MultilevelFeedback),
            other => Err(RunnerError::UnknownAlgorithm(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
enum RunnerError {
    #[error("Unknown algorithm: {0}")]
    UnknownAlgorithm(String),
    #[error("Error: Cannot open file {}", .path.display())]
    OpenInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Error: Cannot read input")]
    Io(#[from] io::Error),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), RunnerError> {
    let algorithm: Algorithm = args.alg.parse()?;
    let workload = load_workload(args.input.as_deref())?;
    let report = simulate(algorithm, args.quantum, workload);

    let stdout = io::stdout();
    output::write_report(&mut stdout.lock(), &report)?;
    Ok(())
}

fn load_workload(path: Option<&Path>) -> Result<Workload, RunnerError> {
    match path {
        Some(path) => {
            let file = File::open(path).map_err(|source| RunnerError::OpenInput {
                path: path.to_path_buf(),
                source,
            })?;
            Ok(input::parse_workload(BufReader::new(file))?)
        }
        None => Ok(input::parse_workload(io::stdin().lock())?),
    }
}

fn simulate(algorithm: Algorithm, quantum: NonZeroU32, workload: Workload) -> SimulationReport {
    match algorithm {
        Algorithm::RoundRobin => Simulation::new(workload, round_robin(quantum)).run(),
        Algorithm::Priority => Simulation::new(workload, priority()).run(),
        Algorithm::MultilevelFeedback => {
            Simulation::new(workload, multilevel_feedback(quantum)).run()
        }
    }
}
