//! stepseq - Step Sequencing Engine
//!
//! CLI for authoring and validating procedure catalogs: loads a catalog,
//! drives a procedure tick by tick against an in-memory host, and
//! optionally records per-tick samples.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use stepseq_catalog::Catalog;
use stepseq_core::{controller, MemoryVariableStore, PresetController, TickOutcome, VariableStore};
use stepseq_recorder::{Recorder, RecorderConfig, SampleReader, TickSample};
use tracing_subscriber::EnvFilter;

mod shim;

use shim::VarOpsEvaluator;

#[derive(Parser, Debug)]
#[command(version, about = "Step sequencing procedure engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a procedure from a catalog against the in-memory host
    Run(RunArgs),
    /// Load and validate a catalog
    Check(CheckArgs),
    /// Print the samples in a recorded file as CSV
    Dump(DumpArgs),
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Catalog file
    #[arg(short, long)]
    catalog: PathBuf,

    /// Procedure id to run
    #[arg(short, long)]
    procedure: i64,

    /// Simulated tick length in milliseconds
    #[arg(long, default_value_t = 100)]
    tick_ms: u64,

    /// Give up after this many ticks
    #[arg(long, default_value_t = 100_000)]
    max_ticks: u64,

    /// Record tick samples into this directory
    #[arg(long)]
    record_dir: Option<PathBuf>,

    /// Pre-seed an evaluator variable (repeatable)
    #[arg(long, value_name = "NAME=VALUE")]
    seed: Vec<String>,

    /// Log skipped steps at info level
    #[arg(long)]
    verbose_steps: bool,
}

#[derive(clap::Args, Debug)]
struct CheckArgs {
    /// Catalog file
    #[arg(short, long)]
    catalog: PathBuf,
}

#[derive(clap::Args, Debug)]
struct DumpArgs {
    /// Recorded sample file
    #[arg(short, long)]
    file: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Command::Run(args) => run(args),
        Command::Check(args) => check(args),
        Command::Dump(args) => dump(args),
    }
}

fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = Catalog::from_file(&args.catalog)?;
    let dt = Duration::from_millis(args.tick_ms);

    // The in-memory host is always ready and always on the ground.
    let mut store = MemoryVariableStore::new();
    store.write(controller::READY_VAR, 1.0);
    store.write(controller::GUARD_VAR, 1.0);
    if args.verbose_steps {
        store.write(controller::VERBOSE_VAR, 1.0);
    }

    let mut evaluator = VarOpsEvaluator::new();
    for seed in &args.seed {
        let (name, value) = parse_seed(seed)?;
        evaluator.seed(name, value);
    }

    let mut controller = PresetController::new();
    controller.initialize(&mut store);
    store.write(controller::REQUEST_VAR, args.procedure as f64);

    let mut recorder = match &args.record_dir {
        Some(dir) => Some(Recorder::open(
            RecorderConfig::default().with_directory(dir),
        )?),
        None => None,
    };

    tracing::info!(
        procedure = args.procedure,
        tick_ms = args.tick_ms,
        "starting run"
    );

    for tick in 0..args.max_ticks {
        let outcome = controller.tick(dt, &mut store, &mut evaluator, &catalog);

        if let Some(recorder) = recorder.as_mut() {
            recorder.record(&TickSample {
                elapsed_ms: tick * args.tick_ms,
                procedure_id: controller.active_request_id(),
                step_index: controller.runner().step_index() as u32,
                step_id: store.read(controller::PROGRESS_ID_VAR) as u32,
                progress: store.read(controller::PROGRESS_VAR),
            })?;
        }

        match outcome {
            TickOutcome::Finished { id } => {
                tracing::info!(
                    id,
                    ticks = tick + 1,
                    evaluations = evaluator.evaluations(),
                    "procedure finished"
                );
                if let Some(recorder) = recorder.take() {
                    recorder.finish()?;
                }
                return Ok(());
            }
            TickOutcome::UnknownProcedure { id } => {
                return Err(format!("procedure {id} is not in the catalog").into());
            }
            TickOutcome::GuardViolation { id } => {
                return Err(format!("guard precondition rejected procedure {id}").into());
            }
            TickOutcome::Faulted { id } => {
                return Err(format!("procedure {id} aborted on an evaluation error").into());
            }
            _ => {}
        }
    }

    Err(format!(
        "procedure {} did not finish within {} ticks; \
         a condition step may never satisfy (seed its variable with --seed)",
        args.procedure, args.max_ticks
    )
    .into())
}

fn check(args: CheckArgs) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = Catalog::from_file(&args.catalog)?;
    println!(
        "catalog ok: {} procedure(s), checksum {}",
        catalog.len(),
        catalog.checksum()
    );
    for id in catalog.procedure_ids() {
        if let Some(procedure) = catalog.get(id) {
            println!(
                "  {:>6}  {} ({} steps)",
                id,
                procedure.name,
                procedure.len()
            );
        }
    }
    Ok(())
}

fn dump(args: DumpArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut reader = SampleReader::open(&args.file)?;
    println!("elapsed_ms,procedure_id,step_index,step_id,progress");
    let mut count = 0u64;
    while let Some(sample) = reader.read_sample()? {
        println!(
            "{},{},{},{},{}",
            sample.elapsed_ms,
            sample.procedure_id,
            sample.step_index,
            sample.step_id,
            sample.progress
        );
        count += 1;
    }
    tracing::info!(count, file = %args.file.display(), "dump complete");
    Ok(())
}

fn parse_seed(seed: &str) -> Result<(&str, f64), Box<dyn std::error::Error>> {
    let (name, value) = seed
        .split_once('=')
        .ok_or_else(|| format!("seed must be NAME=VALUE, got '{seed}'"))?;
    let value: f64 = value
        .parse()
        .map_err(|_| format!("seed value must be numeric, got '{seed}'"))?;
    Ok((name, value))
}
