#![warn(missing_docs)]
//! # parstats
//!
//! Mean, median and population standard deviation of a seeded sample array,
//! computed under five execution strategies so their latencies can be
//! compared:
//! - **Sequential**: all three statistics inline on the calling thread
//! - **Single worker**: one thread or one process computes all three
//! - **Per statistic**: three threads or three processes, one statistic each
//!
//! Thread workers share the sample array read-only. Process workers are the
//! same binary re-executed in worker mode; each one receives its own copy of
//! the samples over a private pipe and answers with one rkyv frame.
//!
//! ## Quick Start
//!
//! ```ignore
//! use parstats::prelude::*;
//!
//! let samples = SampleSet::generate(SampleSpec::default());
//! let clock = MonotonicClock::new();
//! let outcomes = Driver::new(&samples, &clock).run_plan(&Plan::default(), |_| Ok(()))?;
//! ```

// Re-export statistic workers
pub use parstats_stats::{Sample, Statistic, StatsError, Summary, mean, median, std_dev, summarize};

// Re-export core types
pub use parstats_core::{
    Clock, ClockKind, DataError, MonotonicClock, ProcessCpuClock, SampleSet, SampleSpec,
    Stopwatch, TimingRecord, WorkerOutput, WorkerTask, run_task,
};

// Re-export the driver
pub use parstats_cli::{
    Driver, DriverError, MAX_REQUEST_SAMPLES, Plan, PlannedRun, ProcessLauncher, RunState,
    Strategy, StrategyOutcome, WorkerModel, build_report, format_outcome, run,
};

// Re-export reporting
pub use parstats_report::{OutputFormat, Report, generate_json_report, parse_json_report};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Driver, MonotonicClock, Plan, PlannedRun, SampleSet, SampleSpec, Strategy, Summary,
        WorkerModel,
    };
}
