#![warn(missing_docs)]
//! parstats CLI Library
//!
//! Command line, configuration and the execution driver. The `parstats`
//! binary calls [`run`]; the same binary doubles as the worker process when
//! started with the hidden `--stats-worker` flag.

mod config;
mod error;
mod executor;
mod supervisor;

pub use config::*;
pub use error::DriverError;
pub use executor::{
    Driver, Launcher, Plan, PlannedRun, RunState, Strategy, StrategyOutcome, ThreadLauncher,
    ThreadWorker, WorkerModel, assemble, build_report, check_process_payload, format_outcome,
    section_title, worker_label,
};
pub use parstats_ipc::MAX_REQUEST_SAMPLES;
pub use supervisor::{ProcessLauncher, ProcessWorker};

use anyhow::Context;
use clap::{Parser, Subcommand};
use parstats_core::{ClockKind, SampleSet, SampleSpec, WorkerMain};
use parstats_report::{OutputFormat, generate_json_report};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Every run must agree with the first one to this tolerance
pub const CONSISTENCY_EPSILON: f64 = 1e-9;

/// parstats CLI arguments
#[derive(Parser, Debug)]
#[command(name = "parstats")]
#[command(
    author,
    version,
    about = "Mean, median and standard deviation computed sequentially, by threads and by processes"
)]
pub struct Cli {
    /// Optional subcommand (Run, Plan, Init); defaults to Run
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file (default: nearest parstats.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Number of samples
    #[arg(short = 'n', long, global = true)]
    pub count: Option<usize>,

    /// Samples are drawn from [0, RANGE)
    #[arg(short, long, global = true)]
    pub range: Option<u32>,

    /// RNG seed
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Strategy to run (repeatable): sequential, single-worker, per-statistic
    #[arg(long = "strategy", global = true)]
    pub strategies: Vec<Strategy>,

    /// Worker model (repeatable): thread, process
    #[arg(long = "model", global = true)]
    pub models: Vec<WorkerModel>,

    /// Timing source: monotonic, process-cpu
    #[arg(long, global = true)]
    pub clock: Option<ClockKind>,

    /// Output format: human, json
    #[arg(long, global = true)]
    pub format: Option<OutputFormat>,

    /// Output file (stdout if not specified)
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Internal: Run as worker process (used by the process launcher)
    #[arg(long, hide = true)]
    pub stats_worker: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run the plan and report (default)
    Run,
    /// Print the resolved plan without running it
    Plan,
    /// Print a default parstats.toml
    Init,
}

/// Everything one invocation runs with, after layering config and flags
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Shape of the sample array
    pub spec: SampleSpec,
    /// Runs to execute, in order
    pub plan: Plan,
    /// Timing source
    pub clock: ClockKind,
    /// Output format
    pub format: OutputFormat,
    /// Output file, stdout when `None`
    pub output: Option<PathBuf>,
}

impl RunSettings {
    /// Layer CLI flags over the configuration file values
    pub fn resolve(cli: &Cli, config: &StatsConfig) -> anyhow::Result<Self> {
        let spec = SampleSpec::new(
            cli.count.unwrap_or(config.data.count),
            cli.range.unwrap_or(config.data.range),
            cli.seed.unwrap_or(config.data.seed),
        )?;

        let strategies = if cli.strategies.is_empty() {
            &config.runner.strategies
        } else {
            &cli.strategies
        };
        let models = if cli.models.is_empty() {
            &config.runner.models
        } else {
            &cli.models
        };
        let plan = Plan::build(strategies, models);
        if plan.is_empty() {
            anyhow::bail!("nothing to run: no strategy selected for the selected worker models");
        }
        if plan.uses(WorkerModel::Process) {
            check_process_payload(spec.count())?;
        }

        let clock = match cli.clock {
            Some(clock) => clock,
            None => config
                .runner
                .clock
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))
                .context("invalid [runner] clock")?,
        };
        let format = match cli.format {
            Some(format) => format,
            None => config
                .output
                .format
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))
                .context("invalid [output] format")?,
        };

        Ok(Self {
            spec,
            plan,
            clock,
            format,
            output: cli.output.clone(),
        })
    }
}

/// Run the parstats CLI with the process arguments.
///
/// # Returns
/// Returns `Ok(())` on success, or an error if something goes wrong.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the parstats CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    // Handle worker mode first (before any other initialization)
    if cli.stats_worker {
        return run_worker_mode();
    }

    init_logging(cli.verbose);

    let command = cli.command.unwrap_or(Commands::Run);
    if command == Commands::Init {
        print!("{}", StatsConfig::default_toml());
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => StatsConfig::load(path)?,
        None => StatsConfig::discover()?.unwrap_or_default(),
    };
    let settings = RunSettings::resolve(&cli, &config)?;

    match command {
        Commands::Plan => {
            print_plan(&settings);
            Ok(())
        }
        _ => run_plan(&settings),
    }
}

fn init_logging(verbose: bool) {
    let default_directive = if verbose {
        "parstats=debug"
    } else {
        "parstats=info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run as a worker process (IPC mode)
fn run_worker_mode() -> anyhow::Result<()> {
    WorkerMain::from_env()
        .run()
        .map_err(|e| anyhow::anyhow!("Worker error: {}", e))
}

fn print_plan(settings: &RunSettings) {
    println!("parstats Plan:");
    println!(
        "├── samples: {} values in [0, {}), seed {}",
        settings.spec.count(),
        settings.spec.range(),
        settings.spec.seed()
    );
    println!("├── clock: {}", settings.clock);
    for run in settings.plan.runs() {
        println!("│   ├── {} ({} workers)", run, run.worker_count());
    }
    println!("{} runs planned.", settings.plan.runs().len());
}

fn run_plan(settings: &RunSettings) -> anyhow::Result<()> {
    let samples = SampleSet::generate(settings.spec);
    let clock = settings
        .clock
        .build()
        .with_context(|| format!("clock {} is not available", settings.clock))?;
    let driver = Driver::new(&samples, clock.as_ref());

    let mut out: Box<dyn Write> = match &settings.output {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout()),
    };

    let outcomes = match settings.format {
        OutputFormat::Human => driver.run_plan(&settings.plan, |outcome| {
            out.write_all(format_outcome(outcome).as_bytes())?;
            out.flush()
        })?,
        OutputFormat::Json => driver.run_plan(&settings.plan, |_| Ok(()))?,
    };

    let report = build_report(&outcomes, &settings.spec, clock.name());
    if settings.format == OutputFormat::Json {
        let json = generate_json_report(&report).context("failed to serialize report")?;
        writeln!(out, "{}", json)?;
        out.flush()?;
    }

    if let Some(path) = &settings.output {
        tracing::info!(path = %path.display(), "report written");
    }

    if let Err(mismatches) = report.check_consistency(CONSISTENCY_EPSILON) {
        for mismatch in &mismatches {
            eprintln!("mismatch: {}", mismatch);
        }
        anyhow::bail!("{} run(s) disagree with the first run", mismatches.len());
    }

    Ok(())
}
