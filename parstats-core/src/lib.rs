#![warn(missing_docs)]
//! parstats Core - Samples, Tasks and Timing
//!
//! This crate provides what every execution strategy shares:
//! - `SampleSet`, the seeded, immutable sample array
//! - `WorkerTask` dispatch onto the statistic workers
//! - Pluggable timing sources (`Clock`)
//! - `WorkerMain`, the entry point of an isolated worker process

mod measure;
mod samples;
mod task;
mod worker;

pub use measure::{Clock, ClockKind, MonotonicClock, ProcessCpuClock, Stopwatch, TimingRecord};
pub use parstats_ipc::WorkerTask;
pub use samples::{DEFAULT_COUNT, DEFAULT_RANGE, DEFAULT_SEED, DataError, SampleSet, SampleSpec};
pub use task::{WorkerOutput, run_task, task_statistics};
pub use worker::{WorkerError, WorkerMain};
